use std::fmt::Display;
use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use resbridge_query::Array;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ArrayOutput<'a, T> {
    command: &'a str,
    #[serde(flatten)]
    array: &'a Array<T>,
}

#[derive(Serialize)]
struct ListOutput<'a, T> {
    command: &'a str,
    count: usize,
    items: &'a [T],
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Print an array with its last axis as columns and the other axes as rows.
pub fn print_array<T>(command: &str, array: &Array<T>, columns: &[String], format: OutputFormat)
where
    T: Serialize + Display,
{
    match format {
        OutputFormat::Json => print_json(&ArrayOutput { command, array }),
        OutputFormat::Table => {
            let rows = array_rows(array);
            let mut header = vec!["INDEX".to_string()];
            header.extend(column_labels(array, columns));
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(header);
            for (index, values) in rows {
                let mut row = vec![index];
                row.extend(values);
                table.add_row(row);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{command} dims={:?} values={}", array.dims(), array.len());
            for (index, values) in array_rows(array) {
                println!("  {index}: {}", values.join(" "));
            }
        }
        OutputFormat::Raw => {
            for value in array.data() {
                println!("{value}");
            }
        }
    }
}

/// Print a list of records, one row each.
pub fn print_list<T: Serialize>(
    command: &str,
    items: &[T],
    headers: &[&str],
    row: impl Fn(&T) -> Vec<String>,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => print_json(&ListOutput {
            command,
            count: items.len(),
            items,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(headers.to_vec());
            for item in items {
                table.add_row(row(item));
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{command}: {} item(s)", items.len());
            for item in items {
                let fields = headers
                    .iter()
                    .zip(row(item))
                    .map(|(h, v)| format!("{}={v}", h.to_ascii_lowercase()))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("  {fields}");
            }
        }
        OutputFormat::Raw => {
            for item in items {
                println!("{}", row(item).join("\t"));
            }
        }
    }
}

fn column_labels<T>(array: &Array<T>, columns: &[String]) -> Vec<String> {
    let count = array.dims().last().copied().unwrap_or(0);
    (0..count)
        .map(|c| columns.get(c).cloned().unwrap_or_else(|| format!("{}", c + 1)))
        .collect()
}

/// `(row label, column values)` with the first index varying fastest.
fn array_rows<T: Display>(array: &Array<T>) -> Vec<(String, Vec<String>)> {
    let Some((&columns, rest)) = array.dims().split_last() else {
        return Vec::new();
    };
    let row_count: usize = rest.iter().product();
    if rest.is_empty() {
        let values = array.data().iter().map(ToString::to_string).collect();
        return vec![("0".to_string(), values)];
    }

    (0..row_count)
        .map(|r| {
            let mut remainder = r;
            let index = rest
                .iter()
                .map(|d| {
                    let i = remainder % d;
                    remainder /= d;
                    i.to_string()
                })
                .collect::<Vec<_>>()
                .join(",");
            let values = (0..columns)
                .filter_map(|c| array.data().get(r + c * row_count))
                .map(ToString::to_string)
                .collect();
            (index, values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_follow_column_major_order() {
        let array = Array::new("t", vec![2, 3], vec![1, 2, 3, 4, 5, 6]).unwrap();
        let rows = array_rows(&array);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ("0".to_string(), vec!["1".into(), "3".into(), "5".into()]));
        assert_eq!(rows[1].1, vec!["2", "4", "6"]);
    }

    #[test]
    fn grid_rows_carry_multi_index() {
        let array = Array::new("t", vec![2, 2, 1, 1], vec![0.5, 1.5, 2.5, 3.5]).unwrap();
        let rows = array_rows(&array);
        assert_eq!(rows[3].0, "1,1,0");
        assert_eq!(rows[3].1, vec!["3.5"]);
    }

    #[test]
    fn missing_labels_fall_back_to_numbers() {
        let array = Array::new("t", vec![1, 3], vec![0, 0, 0]).unwrap();
        let labels = column_labels(&array, &["X".to_string()]);
        assert_eq!(labels, vec!["X", "2", "3"]);
    }

    #[test]
    fn array_json_is_flat() {
        let array = Array::new("t", vec![1, 2], vec![1.0, 2.0]).unwrap();
        let json = serde_json::to_string(&ArrayOutput {
            command: "GetActiveCellProperty",
            array: &array,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"command":"GetActiveCellProperty","dims":[1,2],"data":[1.0,2.0]}"#
        );
    }
}
