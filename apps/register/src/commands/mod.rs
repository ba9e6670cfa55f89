//! # Register Commands
//!
//! One async function per channel name. Each takes the database handle and a
//! deserialized payload and returns `Result<T, ApiError>`; the dispatcher
//! decides where they run.
//!
//! ## Available Commands
//! - [`sale::checkout`] (`sales:checkout`)
//! - [`sale::delete_sale`] (`sales:delete`)
//! - [`sale::update_sale`] (`sales:update`)
//! - [`sale::list_sales`] (`sales:list`)

pub mod sale;
