#![no_std]

pub mod acquisition;
