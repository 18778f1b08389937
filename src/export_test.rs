use super::*;

struct Row {
    name: String,
    qty: i64,
}

fn columns() -> Vec<Column<Row>> {
    vec![
        Column { header: "Nama", extract: |r| r.name.clone() },
        Column { header: "Stok", extract: |r| r.qty.to_string() },
    ]
}

#[test]
fn plain_fields_pass_through_unquoted() {
    assert_eq!(escape_field("Budi Santoso"), "Budi Santoso");
    assert_eq!(escape_field(""), "");
}

#[test]
fn special_characters_trigger_quoting() {
    assert_eq!(escape_field("a,b"), "\"a,b\"");
    assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
    assert_eq!(escape_field("cr\rhere"), "\"cr\rhere\"");
    assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
}

#[test]
fn field_with_comma_quote_and_newline_doubles_quotes() {
    assert_eq!(escape_field("a,b\"c\nd"), "\"a,b\"\"c\nd\"");
}

#[test]
fn csv_has_header_row_and_crlf_line_endings() {
    let rows = vec![Row { name: "Kabel".into(), qty: 4 }, Row { name: "Layar, LCD".into(), qty: 2 }];
    let csv = to_csv(&rows, &columns());

    assert_eq!(csv, "Nama,Stok\r\nKabel,4\r\n\"Layar, LCD\",2\r\n");
}

#[test]
fn csv_of_empty_collection_is_just_the_header() {
    let csv = to_csv(&[], &columns());
    assert_eq!(csv, "Nama,Stok\r\n");
}

#[test]
fn xlsx_produces_a_zip_container() {
    let rows = vec![Row { name: "Kabel".into(), qty: 4 }];
    let bytes = to_xlsx(&rows, &columns()).unwrap();

    // XLSX is a zip archive; check the magic bytes.
    assert!(bytes.len() > 4);
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn filename_embeds_report_range_and_date() {
    let name = export_filename("servis", "30hari", "csv");
    assert!(name.starts_with("laporan_servis_30hari_"), "got: {name}");
    assert!(name.ends_with(".csv"), "got: {name}");

    // laporan_servis_30hari_YYYY-MM-DD.csv
    let date_part = name
        .trim_start_matches("laporan_servis_30hari_")
        .trim_end_matches(".csv");
    assert_eq!(date_part.len(), 10);
    assert_eq!(date_part.matches('-').count(), 2);
}

#[test]
fn all_time_range_uses_semua_tag() {
    let name = export_filename("inventaris", "semua", "xlsx");
    assert!(name.starts_with("laporan_inventaris_semua_"), "got: {name}");
    assert!(name.ends_with(".xlsx"), "got: {name}");
}
