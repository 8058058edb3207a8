pub mod ask;
pub mod inspect;
