//! # railbook-cli: CLI Tool for Railbook
//!
//! Provides the `railbook` command-line interface.
//!
//! ## Subcommands
//!
//! - `railbook simulate`: Replay a YAML booking scenario and print a JSON
//!   report.
//! - `railbook config`: Print the effective ledger configuration.
//!
//! ```bash
//! railbook simulate demos/two_seat_train.yaml
//! railbook --config railbook.yaml config --format json
//! RAILBOOK_REFUND_CUTOFF_MS=600000 railbook -vv simulate scenario.yaml --out report.json
//! ```

pub mod settings;
pub mod simulate;
