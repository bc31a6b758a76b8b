mod progress;
mod styling;

pub use progress::PollProgress;
pub use styling::{cyan, dim, status};

use styling::magenta_bold;

/// Prints the `pipescope` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔭 pipescope"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CI pipeline watcher")
    );
}
