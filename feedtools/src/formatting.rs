use feed_engine::{
    config::{ChannelMappings, StoreEntry},
    helpers::human_size,
    ChannelReport,
    ConfigError,
    StoreRunReport,
};
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_style(table: &mut Table) {
    table.set_format(markdown_format());
}

fn upload_status(channel: &ChannelReport) -> String {
    match &channel.upload {
        None => "-".to_string(),
        Some(Ok(url)) => url.clone(),
        Some(Err(_)) => "failed".to_string(),
    }
}

pub fn format_run_reports(reports: &[StoreRunReport]) -> String {
    if reports.is_empty() {
        return "No stores were processed".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["Store", "Channel", "Items", "Misses", "XML", "Gzip", "Ratio", "Upload"]);
    let mut errors = Vec::new();
    for report in reports {
        for channel in &report.channels {
            let files = &channel.files;
            table.add_row(row![
                report.store,
                channel.channel,
                channel.items,
                channel.misses,
                files.xml_path.as_ref().map(|_| human_size(files.xml_size)).unwrap_or_else(|| "-".into()),
                files.gzip_size.map(human_size).unwrap_or_else(|| "-".into()),
                files.compression_ratio().map(|r| format!("{:.0}%", r * 100.0)).unwrap_or_else(|| "-".into()),
                upload_status(channel)
            ]);
            if let Some(Err(e)) = &channel.upload {
                errors.push(e.to_string());
            }
        }
        if let Some(e) = &report.error {
            table.add_row(row![report.store, "-", "-", "-", "-", "-", "-", "failed"]);
            errors.push(e.to_string());
        }
    }
    markdown_style(&mut table);
    if errors.is_empty() {
        format!("{table}\n")
    } else {
        let notes = errors.iter().map(|e| format!("* {e}")).collect::<Vec<String>>().join("\n");
        format!("{table}\n## Errors\n{notes}")
    }
}

pub fn format_stores(entries: &[StoreEntry]) -> String {
    if entries.is_empty() {
        return "No stores are configured".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["Store", "Domain", "Language", "Currency", "API version", "Status"]);
    for entry in entries {
        match entry {
            Ok(store) => {
                table.add_row(row![
                    store.name,
                    store.shop_domain,
                    store.language,
                    store.currency,
                    store.api_version,
                    "ok"
                ]);
            },
            Err(ConfigError::Store { store, message }) => {
                table.add_row(row![store, "-", "-", "-", "-", message]);
            },
            Err(e) => {
                table.add_row(row!["?", "-", "-", "-", "-", e.to_string()]);
            },
        }
    }
    markdown_style(&mut table);
    format!("{table}\n")
}

pub fn format_channels(mappings: &ChannelMappings) -> String {
    let mut table = Table::new();
    table.set_titles(row!["Channel", "Fields", "Namespace"]);
    for channel in mappings.channels() {
        let namespace = channel.namespace.as_ref().map(|ns| format!("{} = {}", ns.prefix, ns.uri)).unwrap_or_default();
        table.add_row(row![channel.name, channel.fields.len(), namespace]);
    }
    markdown_style(&mut table);
    format!("{table}\n")
}
