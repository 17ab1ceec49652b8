use serde::Serialize;

use crate::cmd::{open_reader, DumpArgs};
use crate::exit::{trace_file_error, CliResult, SUCCESS};
use crate::output::{format_timestamp, new_table, print_json, OutputFormat};

#[derive(Serialize)]
struct MessageRow {
    index: usize,
    kind: &'static str,
    channel: String,
    timestamp_ns: u64,
    size: usize,
}

pub fn run(args: DumpArgs, format: OutputFormat) -> CliResult<i32> {
    let mut reader = open_reader(&args.path, args.input_type, args.skip_non_osi)?;
    let limit = args.count.unwrap_or(usize::MAX);

    let mut table = new_table(&["#", "KIND", "CHANNEL", "TIMESTAMP", "SIZE"]);
    let mut index = 0usize;
    while index < limit && reader.has_next() {
        let Some(result) = reader
            .read_message()
            .map_err(|err| trace_file_error("failed to read message", err))?
        else {
            break;
        };
        let row = MessageRow {
            index,
            kind: result.message_type.name(),
            channel: result.channel_name,
            timestamp_ns: result.message.timestamp_nanos(),
            size: result.message.encoded_len(),
        };
        match format {
            OutputFormat::Json => print_json(&row),
            OutputFormat::Table => {
                table.add_row(vec![
                    row.index.to_string(),
                    row.kind.to_string(),
                    row.channel,
                    format_timestamp(row.timestamp_ns),
                    row.size.to_string(),
                ]);
            }
            OutputFormat::Pretty => println!(
                "#{} kind={} channel={} timestamp={} size={}",
                row.index,
                row.kind,
                if row.channel.is_empty() { "-" } else { row.channel.as_str() },
                format_timestamp(row.timestamp_ns),
                row.size
            ),
        }
        index += 1;
    }
    reader.close();

    if matches!(format, OutputFormat::Table) {
        println!("{table}");
    }
    tracing::debug!(path = %args.path.display(), messages = index, "dump finished");
    Ok(SUCCESS)
}
