//! demo_list_datastreams - Summarize the datastreams of a FOXML object.
//!
//! This demo reads a FOXML file and prints one line per datastream with its
//! version count and the ID, mimetype and size of the latest version. It also
//! reports the total encoded size across all versions that declare a `SIZE`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example demo_list_datastreams <object.xml>
//! ```

use std::env;
use std::fs;
use std::process;

use foxml_inject::pipeline::list_datastreams;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <object.xml>", args[0]);
        process::exit(1);
    }

    let xml = match fs::read(&args[1]) {
        Ok(xml) => xml,
        Err(e) => {
            eprintln!("Error reading {}: {}", args[1], e);
            process::exit(1);
        }
    };

    let datastreams = match list_datastreams(&xml) {
        Ok(list) => list,
        Err(e) => {
            eprintln!("Error parsing {}: {}", args[1], e);
            process::exit(1);
        }
    };

    println!(
        "{:<20} {:>8} {:<16} {:<28} {:>12}",
        "Datastream", "Versions", "Latest", "Mimetype", "Size"
    );

    let mut total: u64 = 0;
    for ds in &datastreams {
        total += ds.versions.iter().filter_map(|v| v.size).sum::<u64>();
        let latest = ds.latest();
        println!(
            "{:<20} {:>8} {:<16} {:<28} {:>12}",
            ds.id,
            ds.versions.len(),
            latest.and_then(|v| v.id.as_deref()).unwrap_or("-"),
            latest.and_then(|v| v.mimetype.as_deref()).unwrap_or("-"),
            latest
                .and_then(|v| v.size)
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }

    println!();
    println!("{} datastreams, {} bytes declared", datastreams.len(), total);
}
