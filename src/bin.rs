#[macro_use]
extern crate log;

use std::io::{self, Write};

use async_std::task;

use fetchonce::results::FetchResult;
use fetchonce::{fetch_once, write_json};

async fn run() -> FetchResult<()> {
    let value = fetch_once().await?;
    write_json(&mut io::stdout(), &value)
}

fn main() {
    pretty_env_logger::init();
    debug!("Starting fetchonce");
    match task::block_on(run()) {
        Ok(()) => {
            debug!("Command fetchonce ended succesfully");
        }
        Err(err) => {
            let _ = writeln!(&mut io::stderr(), "{}", err);
            std::process::exit(1);
        }
    }
}
