//! The seven migration stages, one `impl Migrator` block per entity kind,
//! in the order `Migrator::run` executes them.
mod studies;
mod surveys;
mod settings;
mod admins;
mod users;
mod chunks;
