pub mod booking;
pub mod coupon;
pub mod identity;
pub mod payment;
pub mod property;
pub mod refund;
pub mod settlement;

pub use booking::*;
pub use coupon::*;
pub use identity::*;
pub use payment::*;
pub use property::*;
pub use refund::*;
pub use settlement::*;
