pub mod bookings;
pub mod coupons;
pub mod payouts;
pub mod properties;
pub mod refunds;
pub mod root;
