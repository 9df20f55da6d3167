pub mod block;
pub mod locker;
pub mod occupancy;
pub mod user;
