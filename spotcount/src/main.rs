mod application;
mod presentation;

use spotcount_core::error::Result;

fn main() -> Result<()> {
    application::run()
}
