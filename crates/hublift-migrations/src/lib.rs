//! Database migrations for the Hublift import engine

pub use sea_orm_migration::prelude::*;

mod migration;

pub use migration::Migrator;
