use fuzzy_folder_nvim::events::EventQueue;
use fuzzy_folder_nvim::picker::FolderPicker;
use fuzzy_folder_nvim::{health, PickerConfig, PickerEvent};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(base_dir) = args.next() else {
        eprintln!("usage: folder_probe <base-dir> [query]");
        std::process::exit(2);
    };
    let query = args.next();

    let config = PickerConfig::with_base_dir(base_dir);
    for report in health::check_binaries(&config) {
        info!(
            "{}: available={} version={:?}",
            report.program, report.available, report.version
        );
    }

    let picker = match FolderPicker::from_config(config, EventQueue::new()) {
        Ok(picker) => picker,
        Err(e) => {
            error!("Failed to create picker: {}", e);
            std::process::exit(1);
        }
    };

    let initial = match picker.invoke() {
        Ok(items) => items,
        Err(e) => {
            error!("Folder listing failed: {}", e);
            std::process::exit(1);
        }
    };

    let Some(query) = query else {
        initial.iter().for_each(|item| println!("{item}"));
        return;
    };

    let request = match picker.on_input_change(&query) {
        Ok(request) => request,
        Err(e) => {
            error!("Filter failed to start: {}", e);
            std::process::exit(1);
        }
    };

    loop {
        let events = picker.widget().wait(Duration::from_secs(30));
        if events.is_empty() {
            error!("Timed out waiting for filter {}", request);
            std::process::exit(1);
        }

        for event in events {
            match event {
                PickerEvent::Items { request: r, items, .. } if r == request => {
                    items.iter().for_each(|item| println!("{item}"));
                    picker.dismiss();
                    return;
                }
                PickerEvent::Error { message } => {
                    error!("Filter failed: {}", message);
                    std::process::exit(1);
                }
                _ => {}
            }
        }
    }
}
