pub mod bridge;
pub mod observable;
