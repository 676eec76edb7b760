//! telemstore command-line entrypoint.

use telemstore::run;
use telemstore::ui::messages::error;

fn main() {
    if let Err(e) = run() {
        error(e);
        std::process::exit(1);
    }
}
