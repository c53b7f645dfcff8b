pub mod class;
pub mod code;
pub mod flags;
pub mod repo;

extern crate anyhow;
extern crate bitflags;
extern crate enum_as_inner;
extern crate support;
