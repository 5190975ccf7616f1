//! Stat command - print metadata for paths.

use crate::app::App;
use chrono::{DateTime, Local, Utc};
use std::path::PathBuf;
use tracing::warn;
use winstat_core::{Config, DevFormat, OutputFormat, Snapshot};

/// Run the stat command.
pub fn run(
    config: Config,
    paths: &[PathBuf],
    output: Option<OutputFormat>,
    utc: bool,
) -> anyhow::Result<()> {
    let format = output.unwrap_or(config.output.format);
    let utc = utc || config.output.utc;
    let show_streams = config.output.show_streams;
    let app = App::new(config);

    let mut snapshots = Vec::with_capacity(paths.len());
    let mut failures = 0usize;

    for path in paths {
        match app.snapshot(path) {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Query failed");
                eprintln!("winstat: cannot stat '{}': {}", path.display(), e);
                failures += 1;
            }
        }
    }

    match format {
        OutputFormat::Text => {
            for (i, snapshot) in snapshots.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print!("{}", render_text(snapshot, utc, show_streams));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&snapshots)?);
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} paths could not be read", failures, paths.len());
    }

    Ok(())
}

/// Render a snapshot in the layout of `stat(1)`.
fn render_text(snapshot: &Snapshot, utc: bool, show_streams: bool) -> String {
    let mut out = String::new();

    out.push_str(&format!("  File: {}\n", snapshot.path()));
    out.push_str(&format!(
        "  Size: {:<12} Blocks: {:<10} IO Block: {:<6} {}\n",
        snapshot.size(),
        optional(snapshot.blocks()),
        optional(snapshot.blksize()),
        describe_type(snapshot)
    ));

    let device = snapshot
        .dev(DevFormat::Letter)
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    let serial = snapshot
        .volume_serial()
        .map(|s| format!("{:08X}", s))
        .unwrap_or_else(|| "-".to_string());
    out.push_str(&format!(
        "Device: {:<6} Serial: {:<10} Inode: {:<20} Links: {}\n",
        device,
        serial,
        optional(snapshot.ino()),
        snapshot.nlink()
    ));

    out.push_str(&format!(
        "Access: ({:04o}/{})  Uid: {} ({})  Gid: {} ({})\n",
        snapshot.mode() & 0o7777,
        mode_string(snapshot.mode()),
        snapshot.uid(),
        snapshot.user_sid(),
        snapshot.gid(),
        snapshot.group_sid()
    ));

    out.push_str(&format!("Access: {}\n", format_time(snapshot.accessed_at(), utc)));
    out.push_str(&format!("Modify: {}\n", format_time(snapshot.modified_at(), utc)));
    out.push_str(&format!(" Birth: {}\n", format_time(snapshot.changed_at(), utc)));

    let attributes: Vec<String> = snapshot
        .attributes()
        .iter_names()
        .map(|(name, _)| name.to_lowercase())
        .collect();
    if !attributes.is_empty() {
        out.push_str(&format!(" Attrs: {}\n", attributes.join(", ")));
    }

    let mut rights = Vec::new();
    if snapshot.is_readable() {
        rights.push("readable");
    }
    if snapshot.is_writable() {
        rights.push("writable");
    }
    if snapshot.is_world_readable() {
        rights.push("world-readable");
    }
    if snapshot.is_world_writable() {
        rights.push("world-writable");
    }
    if !rights.is_empty() {
        out.push_str(&format!("Rights: {}\n", rights.join(", ")));
    }

    if show_streams && !snapshot.streams().is_empty() {
        out.push_str(&format!("Streams: {}\n", snapshot.streams().join(", ")));
    }

    out
}

fn describe_type(snapshot: &Snapshot) -> &'static str {
    match snapshot.file_type_name() {
        "directory" => "directory",
        "characterSpecial" => "character special file",
        "fifo" => "fifo",
        "link" => "symbolic link",
        "file" if snapshot.is_zero_size() => "regular empty file",
        "file" => "regular file",
        _ => "unknown",
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn format_time(time: Option<DateTime<Utc>>, utc: bool) -> String {
    match time {
        None => "-".to_string(),
        Some(t) if utc => t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        Some(t) => t
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S %z")
            .to_string(),
    }
}

/// `ls -l` style permission string, e.g. `-rw-r--r--`.
fn mode_string(mode: u32) -> String {
    let kind = match mode & 0o170000 {
        0o040000 => 'd',
        0o020000 => 'c',
        0o010000 => 'p',
        0o120000 => 'l',
        _ => '-',
    };

    let mut out = String::with_capacity(10);
    out.push(kind);
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}
