pub mod control;
pub mod input;
pub mod tier;
pub mod time;
