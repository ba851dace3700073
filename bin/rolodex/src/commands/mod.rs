pub mod bulk;
pub mod collections;
pub mod status;
pub mod watch;
