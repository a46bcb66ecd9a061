//! Integration tests for the conversion pipeline.
//!
//! Uses a MockFragmentSource that returns pre-built pages without invoking
//! pdftotext, and a MockEmailSource that returns a fixed HTML body, so these
//! tests run without poppler-utils.

use std::io::Write;

use stmt2csv_core::email::EmailBodySource;
use stmt2csv_core::error::ConvertError;
use stmt2csv_core::extraction::{FragmentSource, Page, TextFragment};
use stmt2csv_core::formats::builtin::load_builtin;
use stmt2csv_core::formats::parse_format_str;
use stmt2csv_core::formats::schema::FormatSpec;
use stmt2csv_core::registry::{find_adapter, Adapter};
use stmt2csv_core::{convert_pages, ConvertOptions, Converter};

struct MockFragmentSource {
    pages: Vec<Page>,
}

impl FragmentSource for MockFragmentSource {
    fn extract_pages(&self, _bytes: &[u8]) -> Result<Vec<Page>, ConvertError> {
        Ok(self.pages.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

struct MockEmailSource {
    html: String,
}

impl EmailBodySource for MockEmailSource {
    fn html_body(&self, _bytes: &[u8]) -> Result<String, ConvertError> {
        Ok(self.html.clone())
    }
}

fn frag(text: &str, x: f32, y: f32) -> TextFragment {
    TextFragment {
        text: text.into(),
        x,
        y,
        width: 6.0 * text.chars().count() as f32,
        height: 8.0,
        page_index: 0,
    }
}

fn page(number: usize, fragments: Vec<TextFragment>) -> Page {
    let fragments = fragments
        .into_iter()
        .map(|f| TextFragment {
            page_index: number - 1,
            ..f
        })
        .collect();
    Page {
        page_number: number,
        fragments,
    }
}

/// Header fragments for every label of a format, spaced `step` apart.
fn header_row(spec: &FormatSpec, x0: f32, step: f32, y: f32) -> Vec<TextFragment> {
    spec.headers
        .iter()
        .enumerate()
        .map(|(i, label)| frag(label, x0 + step * i as f32, y))
        .collect()
}

fn converter(pages: Vec<Page>) -> Converter {
    Converter::new(
        Box::new(MockFragmentSource { pages }),
        Box::new(MockEmailSource {
            html: String::new(),
        }),
        ConvertOptions::default(),
    )
}

const DEMO_FORMAT: &str = r#"{
    "key": "demo_bank",
    "name": "Demo Bank",
    "version": "1.0",
    "source": "pdf",
    "headers": ["交易日期", "金额", "余额"],
    "columns": {"right_margin": -0.01},
    "anchor": {"column": 0, "required_header": "交易日期", "patterns": ["\\d{4}-\\d{2}-\\d{2}"]},
    "rows": {"policy": "span", "margin_below": 1, "margin_above": 1}
}"#;

const WRAP_FORMAT: &str = r#"{
    "key": "wrap_bank",
    "name": "Wrap Bank",
    "version": "1.0",
    "source": "pdf",
    "headers": ["交易日期", "摘要", "金额"],
    "columns": {"right_margin": -0.01, "membership": "overlap"},
    "anchor": {"column": 0, "required_header": "交易日期", "patterns": ["\\d{4}-\\d{2}-\\d{2}"]},
    "rows": {"policy": "span", "margin_below": 10, "margin_above": 1}
}"#;

fn demo_adapter() -> Adapter {
    Adapter::from_spec(parse_format_str(DEMO_FORMAT).unwrap())
}

fn demo_headers() -> Vec<TextFragment> {
    vec![
        frag("交易日期", 10.0, 700.0),
        frag("金额", 100.0, 700.0),
        frag("余额", 200.0, 700.0),
    ]
}

fn demo_row(date: &str, amount: &str, balance: &str, y: f32) -> Vec<TextFragment> {
    vec![
        frag(date, 10.0, y),
        frag(amount, 100.0, y),
        frag(balance, 200.0, y),
    ]
}

// ---------------------------------------------------------------------------
// Generic engine
// ---------------------------------------------------------------------------
#[test]
fn single_row_end_to_end() {
    let mut fragments = demo_headers();
    fragments.extend(demo_row("2024-01-05", "100.00", "900.00", 680.0));
    let result = converter(vec![page(1, fragments)])
        .convert(&demo_adapter(), &[])
        .unwrap();

    assert_eq!(result.csv, "交易日期,金额,余额\n2024-01-05,100.00,900.00");
    // The header fragments sit outside every row band.
    assert_eq!(result.ignored.len(), 3);
}

#[test]
fn page_without_anchors_adds_no_rows() {
    let mut first = demo_headers();
    first.extend(demo_row("2024-01-05", "100.00", "900.00", 680.0));
    first.extend(demo_row("2024-01-06", "-50.00", "850.00", 660.0));
    let second = vec![frag("第2页 共2页", 10.0, 30.0), frag("温馨提示", 100.0, 50.0)];

    let spec = parse_format_str(DEMO_FORMAT).unwrap();
    let options = ConvertOptions::default();
    let alone = convert_pages(&[page(1, first.clone())], &spec, &options).unwrap();
    let both = convert_pages(&[page(1, first), page(2, second)], &spec, &options).unwrap();

    assert_eq!(alone.table.rows.len(), 2);
    assert_eq!(both.table.rows.len(), alone.table.rows.len());
    assert_eq!(both.csv, alone.csv);
}

#[test]
fn row_count_matches_anchor_count_across_pages() {
    let mut first = demo_headers();
    first.extend(demo_row("2024-01-05", "100.00", "900.00", 680.0));
    first.extend(demo_row("2024-01-06", "-50.00", "850.00", 660.0));
    first.extend(demo_row("2024-01-07", "20.00", "870.00", 640.0));
    let second = demo_row("2024-01-08", "30.00", "900.00", 720.0);

    let result = converter(vec![page(1, first), page(2, second)])
        .convert(&demo_adapter(), &[])
        .unwrap();

    assert_eq!(result.table.rows.len(), 4);
    assert_eq!(result.table.rows[3], vec!["2024-01-08", "30.00", "900.00"]);
}

#[test]
fn cell_text_follows_encounter_order() {
    let spec = parse_format_str(WRAP_FORMAT).unwrap();
    let header = vec![
        frag("交易日期", 10.0, 700.0),
        frag("摘要", 100.0, 700.0),
        frag("金额", 200.0, 700.0),
    ];
    let mut in_order = header.clone();
    in_order.extend(vec![
        frag("2024-01-05", 10.0, 680.0),
        frag("网上", 100.0, 680.0),
        frag("支付", 100.0, 671.0),
        frag("12.00", 200.0, 680.0),
    ]);
    let mut swapped = header;
    swapped.extend(vec![
        frag("2024-01-05", 10.0, 680.0),
        frag("支付", 100.0, 671.0),
        frag("网上", 100.0, 680.0),
        frag("12.00", 200.0, 680.0),
    ]);

    let options = ConvertOptions::default();
    let a = convert_pages(&[page(1, in_order)], &spec, &options).unwrap();
    let b = convert_pages(&[page(1, swapped)], &spec, &options).unwrap();

    assert_eq!(a.table.rows, vec![vec!["2024-01-05", "网上支付", "12.00"]]);
    assert_eq!(b.table.rows, vec![vec!["2024-01-05", "支付网上", "12.00"]]);
}

#[test]
fn straddling_fragment_lands_in_one_cell() {
    let spec = parse_format_str(WRAP_FORMAT).unwrap();
    let mut fragments = vec![
        frag("交易日期", 10.0, 700.0),
        frag("摘要", 100.0, 700.0),
        frag("金额", 200.0, 700.0),
        frag("2024-01-05", 10.0, 680.0),
    ];
    // 95..215 crosses both the 摘要 and the 金额 boundary.
    fragments.push(TextFragment {
        width: 120.0,
        ..frag("跨列文本", 95.0, 670.0)
    });

    let result = convert_pages(&[page(1, fragments)], &spec, &ConvertOptions::default()).unwrap();
    let row = &result.table.rows[0];
    assert_eq!(row[0], "2024-01-05跨列文本");
    assert_eq!(row[1], "");
    assert_eq!(row[2], "");
}

#[test]
fn conversion_is_idempotent() {
    let mut fragments = demo_headers();
    fragments.extend(demo_row("2024-01-05", "1,100.00", "900.00", 680.0));
    fragments.extend(demo_row("2024-01-06", "-50.00", "850.00", 660.0));
    let conv = converter(vec![page(1, fragments)]);
    let adapter = demo_adapter();

    let first = conv.convert(&adapter, &[]).unwrap();
    let second = conv.convert(&adapter, &[]).unwrap();
    assert_eq!(first.csv, second.csv);
}

#[test]
fn csv_round_trips_through_a_standard_reader() {
    let spec = parse_format_str(WRAP_FORMAT).unwrap();
    let description = "说\"明\",含逗号";
    let fragments = vec![
        frag("交易日期", 10.0, 700.0),
        frag("摘要", 100.0, 700.0),
        frag("金额", 200.0, 700.0),
        frag("2024-01-05", 10.0, 680.0),
        frag(description, 100.0, 680.0),
        frag("1,100.00", 200.0, 680.0),
    ];
    let result = convert_pages(&[page(1, fragments)], &spec, &ConvertOptions::default()).unwrap();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(result.csv.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["交易日期", "摘要", "金额"]);
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][1], description);
    assert_eq!(&records[0][2], "1,100.00");
}

#[test]
fn missing_required_header_is_structural() {
    let fragments = vec![
        frag("金额", 100.0, 700.0),
        frag("余额", 200.0, 700.0),
        frag("2024-01-05", 10.0, 680.0),
    ];
    let err = converter(vec![page(1, fragments)])
        .convert(&demo_adapter(), &[])
        .unwrap_err();
    assert!(matches!(err, ConvertError::Structural(_)));
}

#[test]
fn page_dump_file_converts_like_pdf_pages() {
    let dump = r#"[[
        {"str": "交易日期", "transform": [1, 0, 0, 1, 10, 700], "width": 24, "height": 8},
        {"str": "金额", "transform": [1, 0, 0, 1, 100, 700], "width": 12, "height": 8},
        {"str": "余额", "transform": [1, 0, 0, 1, 200, 700], "width": 12, "height": 8},
        {"type": "beginMarkedContent"},
        {"str": "2024-01-05", "transform": [1, 0, 0, 1, 10, 680], "width": 60, "height": 8},
        {"str": "100.00", "transform": [1, 0, 0, 1, 100, 680], "width": 36, "height": 8},
        {"str": "900.00", "transform": [1, 0, 0, 1, 200, 680], "width": 36, "height": 8}
    ]]"#;
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(dump.as_bytes()).unwrap();

    let result = converter(vec![])
        .convert_file(&demo_adapter(), file.path())
        .unwrap();
    assert_eq!(result.csv, "交易日期,金额,余额\n2024-01-05,100.00,900.00");
}

#[test]
fn unsupported_extension_is_rejected() {
    let adapter = find_adapter("cmb_credit").unwrap();
    let err = converter(vec![])
        .convert_file(adapter, std::path::Path::new("statement.eml"))
        .unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedSource { .. }));
}

#[test]
fn unknown_adapter_is_rejected() {
    assert!(matches!(
        find_adapter("icbc_debit"),
        Err(ConvertError::UnknownAdapter(_))
    ));
}

// ---------------------------------------------------------------------------
// Built-in formats
// ---------------------------------------------------------------------------
#[test]
fn boc_credit_falls_back_to_page_one_headers_and_tags_currency() {
    let adapter = find_adapter("boc_credit").unwrap();
    let summary = vec![
        frag("中国银行信用卡帐单", 40.0, 780.0),
        frag("交易日", 40.0, 500.0),
        frag("银行记账日", 100.0, 500.0),
        frag("卡号后四位", 170.0, 500.0),
        frag("交易描述", 240.0, 500.0),
        frag("存入", 380.0, 500.0),
        frag("支出", 440.0, 500.0),
        // Summary page rows never count.
        frag("2024-01-01", 40.0, 480.0),
    ];
    let detail = vec![
        frag("2024-01-03", 40.0, 700.0),
        frag("2024-01-04", 100.0, 700.0),
        frag("1234", 170.0, 700.0),
        frag("超市购物", 240.0, 700.0),
        frag("58.00", 440.0, 700.0),
        frag("2024-01-05", 40.0, 680.0),
        frag("2024-01-05", 100.0, 680.0),
        frag("1234", 170.0, 680.0),
        frag("还款", 240.0, 680.0),
        frag("1,000.00", 380.0, 680.0),
        frag("外币交易明细", 40.0, 650.0),
        frag("2024-01-06", 40.0, 620.0),
        frag("2024-01-07", 100.0, 620.0),
        frag("1234", 170.0, 620.0),
        frag("AMAZON", 240.0, 620.0),
        frag("9.99", 440.0, 620.0),
    ];

    let result = converter(vec![page(1, summary), page(2, detail)])
        .convert(adapter, &[])
        .unwrap();

    assert_eq!(
        result.csv,
        "中国银行信用卡帐单\n\
         交易日,银行记账日,卡号后四位,交易描述,存入,支出,币种\n\
         2024-01-03,2024-01-04,1234,超市购物,,58.00,CNY\n\
         2024-01-05,2024-01-05,1234,还款,\"1,000.00\",,CNY\n\
         2024-01-06,2024-01-07,1234,AMAZON,,9.99,USD"
    );
}

#[test]
fn boc_debit_appends_card_suffix() {
    let spec = load_builtin("boc_debit").unwrap();
    let mut fragments = vec![
        frag("中国银行交易流水明细单", 10.0, 780.0),
        frag("借记卡号：6217000012345678", 10.0, 760.0),
    ];
    fragments.extend(header_row(&spec, 10.0, 70.0, 700.0));
    fragments.extend(vec![
        frag("2024-01-05", 10.0, 600.0),
        frag("10:00:00", 80.0, 600.0),
        frag("人民币", 150.0, 600.0),
        frag("-1,200.00", 222.0, 600.0),
        frag("8,800.00", 292.0, 600.0),
        frag("网上支付", 360.0, 600.0),
    ]);

    let result = convert_pages(&[page(1, fragments.clone())], &spec, &ConvertOptions::default())
        .unwrap();
    assert_eq!(result.table.header.last().map(String::as_str), Some("借记卡号"));
    assert_eq!(result.table.rows.len(), 1);
    let row = &result.table.rows[0];
    assert_eq!(row[3], "-1,200.00");
    assert_eq!(row[4], "8,800.00");
    assert_eq!(row[5], "网上支付");
    assert_eq!(row.last().map(String::as_str), Some("5678"));
    assert!(result.csv.starts_with("中国银行交易流水明细单\n"));

    fragments.remove(1);
    assert!(matches!(
        convert_pages(&[page(1, fragments)], &spec, &ConvertOptions::default()),
        Err(ConvertError::Structural(_))
    ));
}

#[test]
fn bocom_debit_stops_at_end_marker() {
    let spec = load_builtin("bocom_debit").unwrap();
    let mut first = header_row(&spec, 10.0, 60.0, 700.0);
    first.extend(vec![
        frag("1", 10.0, 680.0),
        frag("2024-01-05", 70.0, 680.0),
        frag("10:00:00", 130.0, 680.0),
        frag("转账", 190.0, 680.0),
        frag("贷", 250.0, 680.0),
        frag("500.00", 310.0, 680.0),
        frag("1500.00", 370.0, 680.0),
        frag("张三", 490.0, 680.0),
        frag("上海", 550.0, 680.0),
        frag("工资", 610.0, 680.0),
        frag("2", 10.0, 660.0),
        frag("2024-01-06", 70.0, 660.0),
        frag("-20.00", 310.0, 660.0),
        frag("打印完毕", 10.0, 640.0),
        frag("3", 10.0, 630.0),
    ]);
    let mut second = header_row(&spec, 10.0, 60.0, 700.0);
    second.push(frag("4", 10.0, 680.0));

    let result = convert_pages(
        &[page(1, first), page(2, second)],
        &spec,
        &ConvertOptions::default(),
    )
    .unwrap();

    assert_eq!(result.table.rows.len(), 2);
    let row = &result.table.rows[0];
    assert_eq!(row[0], "1");
    assert_eq!(row[5], "500.00");
    assert_eq!(row[9], "上海");
    assert_eq!(row[10], "工资");
    assert_eq!(result.table.rows[1][5], "-20.00");
    // Header fragments precede the first anchor.
    assert_eq!(result.ignored.len(), spec.headers.len());
}

#[test]
fn cmb_credit_expands_short_dates_and_drops_fee_waivers() {
    let adapter = find_adapter("cmb_credit").unwrap();
    let headers = vec![
        frag("招商银行信用卡对账单(2024年01月)", 20.0, 780.0),
        frag("交易日", 20.0, 700.0),
        frag("记账日", 80.0, 700.0),
        frag("交易摘要", 140.0, 700.0),
        frag("人民币金额", 300.0, 700.0),
        frag("卡号末四位", 380.0, 700.0),
        frag("交易地金额", 450.0, 700.0),
    ];
    let rows = vec![
        frag("12/29", 20.0, 600.0),
        frag("12/30", 80.0, 600.0),
        frag("超市", 140.0, 600.0),
        frag("100.00", 300.0, 600.0),
        frag("1234", 380.0, 600.0),
        frag("100.00", 450.0, 600.0),
        frag("01/02", 80.0, 580.0),
        frag("本期免年费", 140.0, 580.0),
        frag("0.00", 300.0, 580.0),
        frag("1234", 380.0, 580.0),
        frag("01/03", 20.0, 560.0),
        frag("01/04", 80.0, 560.0),
        frag("餐饮", 140.0, 560.0),
        frag("25.50", 300.0, 560.0),
        frag("1234", 380.0, 560.0),
        frag("25.50", 450.0, 560.0),
    ];
    let mut fragments = headers.clone();
    fragments.extend(rows.clone());

    let result = converter(vec![page(1, fragments)])
        .convert(adapter, &[])
        .unwrap();
    assert_eq!(
        result.csv,
        "招商银行信用卡对账单(2024年01月)\n\
         交易日,记账日,交易摘要,人民币金额,卡号末四位,交易地金额\n\
         2023-12-29,2023-12-30,超市,100.00,1234,100.00\n\
         2024-01-03,2024-01-04,餐饮,25.50,1234,25.50"
    );

    let without_card_header: Vec<TextFragment> = headers
        .into_iter()
        .filter(|f| f.text != "卡号末四位")
        .chain(rows)
        .collect();
    let err = converter(vec![page(1, without_card_header)])
        .convert(adapter, &[])
        .unwrap_err();
    assert!(matches!(err, ConvertError::Structural(_)));
}

#[test]
fn cmb_debit_opens_rows_only_under_date_header() {
    let spec = load_builtin("cmb_debit").unwrap();
    let mut fragments = vec![
        frag("记账日期", 30.0, 700.0),
        frag("货币", 100.0, 700.0),
        frag("交易金额", 150.0, 700.0),
        frag("联机余额", 220.0, 700.0),
        frag("交易摘要", 290.0, 700.0),
        frag("对手信息", 360.0, 700.0),
        frag("客户摘要", 450.0, 700.0),
    ];
    fragments.extend(vec![
        frag("2024-01-05", 30.0, 680.0),
        frag("人民币", 100.0, 680.0),
        frag("-50.00", 150.0, 680.0),
        frag("950.00", 220.0, 680.0),
        frag("2024-01-10", 290.0, 680.0),
        frag("张三", 360.0, 680.0),
        frag("2024-01-06", 30.0, 660.0),
        frag("人民币", 100.0, 660.0),
        frag("100.00", 150.0, 660.0),
        frag("1050.00", 220.0, 660.0),
        frag("工资", 290.0, 660.0),
    ]);

    let result = convert_pages(&[page(1, fragments)], &spec, &ConvertOptions::default()).unwrap();
    assert_eq!(result.table.rows.len(), 2);
    assert_eq!(result.table.rows[0][4], "2024-01-10");
    assert_eq!(result.table.rows[1][0], "2024-01-06");
    assert_eq!(result.table.rows[1][4], "工资");
}

#[test]
fn abc_debit_skips_repeated_headers() {
    let spec = load_builtin("abc_debit").unwrap();
    let mut first = header_row(&spec, 10.0, 60.0, 700.0);
    first.extend(vec![
        frag("20240105", 10.0, 680.0),
        frag("10:23:45", 70.0, 680.0),
        frag("工资", 130.0, 680.0),
    ]);
    let mut second = header_row(&spec, 10.0, 60.0, 700.0);
    second.push(frag("20240106", 10.0, 680.0));

    let result = convert_pages(
        &[page(1, first), page(2, second)],
        &spec,
        &ConvertOptions {
            include_title: false,
        },
    )
    .unwrap();
    assert_eq!(result.table.rows.len(), 2);
    assert_eq!(result.table.rows[0][..3], ["20240105", "10:23:45", "工资"]);
    assert!(result.ignored.is_empty());
}

#[test]
fn bocom_credit_reads_matching_email_tables() {
    let html = r#"<html><body>
<table><thead><tr><th>本期应还款额</th></tr></thead><tbody><tr><td>100.00</td></tr></tbody></table>
<table>
  <thead><tr><th>交易日期</th><th>记账日期</th><th>交易说明</th><th>交易币种/金额</th><th>入账币种/金额</th></tr></thead>
  <tbody>
    <tr><td>2024/01/05</td><td>2024/01/06</td><td>消费 超市</td><td>CNY 100.00</td><td>CNY 100.00</td></tr>
    <tr><td>2024/01/07</td><td>2024/01/08</td><td>还款</td><td>CNY -1,000.00</td><td>CNY -1,000.00</td></tr>
    <tr><td colspan="5">以下为分期交易</td></tr>
  </tbody>
</table>
</body></html>"#;
    let conv = Converter::new(
        Box::new(MockFragmentSource { pages: vec![] }),
        Box::new(MockEmailSource { html: html.into() }),
        ConvertOptions::default(),
    );

    let result = conv.convert(find_adapter("bocom_credit").unwrap(), &[]).unwrap();
    assert_eq!(
        result.csv,
        "交易日期,记账日期,交易说明,交易币种/金额,入账币种/金额\n\
         2024/01/05,2024/01/06,消费 超市,CNY 100.00,CNY 100.00\n\
         2024/01/07,2024/01/08,还款,\"CNY -1,000.00\",\"CNY -1,000.00\""
    );
}
