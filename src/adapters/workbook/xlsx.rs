//! Streaming XLSX encoder
//!
//! Writes an Office Open XML spreadsheet through `zip` in streaming mode: sheet
//! parts are encoded as rows arrive, the workbook, relationship, content-type
//! and style parts are written at finalize. Encoded bytes collect in a shared
//! buffer and are pushed into a bounded channel once the buffer passes the
//! flush threshold, so a slow consumer suspends the writer.

use crate::adapters::workbook::traits::{SheetHandle, SheetProtocol, WorkbookSink};
use crate::domain::{Cell, CellFormat, CellValue, FolioError, Result, SinkError};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use zip::write::{SimpleFileOptions, StreamWriter};
use zip::{CompressionMethod, ZipWriter};

/// Default number of buffered bytes that triggers a flush downstream
pub const DEFAULT_FLUSH_THRESHOLD: usize = 64 * 1024;

/// Column width applied to every column
pub const COLUMN_WIDTH: u32 = 20;

/// Sheet written when an export produced no sheets at all
pub const BLANK_SHEET_NAME: &str = "Sheet1";

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const CT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<numFmts count="1"><numFmt numFmtId="164" formatCode="&quot;$&quot;#,##0.00"/></numFmts>"#,
    r#"<fonts count="2">"#,
    r#"<font><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#,
    r#"<font><u/><sz val="11"/><color rgb="FF0563C1"/><name val="Calibri"/><family val="2"/></font>"#,
    r#"</fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="3">"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
    r#"</cellXfs>"#,
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    r#"</styleSheet>"#,
);

const SHEET_FOOTER: &str = "</sheetData></worksheet>";

/// Chunk stream item handed to the HTTP body or a file writer
pub type ByteChunk = io::Result<Bytes>;

/// Byte buffer shared between the zip writer and the flusher
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// [`WorkbookSink`] producing an XLSX byte stream
pub struct XlsxSink {
    zip: Option<ZipWriter<StreamWriter<SharedBuffer>>>,
    buffer: SharedBuffer,
    tx: Option<mpsc::Sender<ByteChunk>>,
    flush_threshold: usize,
    protocol: SheetProtocol,
    next_row: u32,
    scratch: String,
    bytes_sent: u64,
}

impl XlsxSink {
    /// Creates a sink that flushes into `tx`
    pub fn new(tx: mpsc::Sender<ByteChunk>, flush_threshold: usize) -> Self {
        let buffer = SharedBuffer::default();
        Self {
            zip: Some(ZipWriter::new_stream(buffer.clone())),
            buffer,
            tx: Some(tx),
            flush_threshold: flush_threshold.max(1),
            protocol: SheetProtocol::new(),
            next_row: 0,
            scratch: String::new(),
            bytes_sent: 0,
        }
    }

    /// Creates a sink together with the receiving end of its byte stream
    ///
    /// `capacity` bounds the number of unconsumed chunks.
    pub fn channel(capacity: usize, flush_threshold: usize) -> (Self, mpsc::Receiver<ByteChunk>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx, flush_threshold), rx)
    }

    /// Bytes handed downstream so far
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    fn zip(&mut self) -> Result<&mut ZipWriter<StreamWriter<SharedBuffer>>> {
        self.zip
            .as_mut()
            .ok_or(FolioError::Sink(SinkError::AlreadyFinalized))
    }

    fn start_part(&mut self, path: &str) -> Result<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip()?.start_file(path, options)?;
        Ok(())
    }

    fn write_part(&mut self, content: &str) -> Result<()> {
        self.zip()?
            .write_all(content.as_bytes())
            .map_err(|e| SinkError::Encoding(e.to_string()))?;
        Ok(())
    }

    fn begin_sheet(&mut self, index: usize) -> Result<()> {
        self.start_part(&sheet_path(index))?;
        self.write_part(&sheet_header())?;
        self.next_row = 0;
        Ok(())
    }

    /// Sends buffered bytes downstream, waiting for channel capacity
    async fn flush(&mut self, force: bool) -> Result<()> {
        if !force && self.buffer.len() < self.flush_threshold {
            return Ok(());
        }
        let chunk = self.buffer.take();
        if chunk.is_empty() {
            return Ok(());
        }
        let len = chunk.len() as u64;
        let tx = self
            .tx
            .as_ref()
            .ok_or(FolioError::Sink(SinkError::AlreadyFinalized))?;
        tx.send(Ok(Bytes::from(chunk)))
            .await
            .map_err(|_| FolioError::Cancelled("Download stream closed by the client".to_string()))?;
        self.bytes_sent += len;
        Ok(())
    }

    async fn finish_workbook(&mut self, abandoned: Option<usize>) -> Result<()> {
        if abandoned.is_some() {
            self.write_part(SHEET_FOOTER)?;
        }

        let mut names: Vec<String> = self.protocol.sheet_names().to_vec();
        if names.is_empty() {
            self.begin_sheet(0)?;
            self.write_part(SHEET_FOOTER)?;
            names.push(BLANK_SHEET_NAME.to_string());
        }

        self.start_part("xl/workbook.xml")?;
        self.write_part(&workbook_xml(&names))?;
        self.start_part("xl/_rels/workbook.xml.rels")?;
        self.write_part(&workbook_rels_xml(names.len()))?;
        self.start_part("xl/styles.xml")?;
        self.write_part(STYLES_XML)?;
        self.start_part("_rels/.rels")?;
        self.write_part(&root_rels_xml())?;
        self.start_part("[Content_Types].xml")?;
        self.write_part(&content_types_xml(names.len()))?;

        if let Some(zip) = self.zip.take() {
            zip.finish()?;
        }
        self.flush(true).await
    }
}

#[async_trait]
impl WorkbookSink for XlsxSink {
    async fn open_sheet(&mut self, name: &str) -> Result<SheetHandle> {
        let handle = self.protocol.open(name)?;
        self.begin_sheet(handle.index())?;
        tracing::debug!(sheet = name, "Opened sheet");
        Ok(handle)
    }

    async fn write_row(&mut self, sheet: &SheetHandle, cells: &[Cell]) -> Result<()> {
        self.protocol.check_open(sheet)?;
        if self.is_cancelled() {
            return Err(FolioError::Cancelled(
                "Download stream closed by the client".to_string(),
            ));
        }

        self.next_row += 1;
        let mut xml = std::mem::take(&mut self.scratch);
        xml.clear();
        row_xml(&mut xml, self.next_row, cells);
        let written = self.write_part(&xml);
        self.scratch = xml;
        written?;

        self.flush(false).await
    }

    async fn close_sheet(&mut self, sheet: SheetHandle) -> Result<()> {
        self.protocol.close(&sheet)?;
        self.write_part(SHEET_FOOTER)?;
        tracing::debug!(sheet = sheet.name(), rows = self.next_row, "Closed sheet");
        self.flush(false).await
    }

    async fn finalize(&mut self) -> Result<()> {
        let abandoned = self.protocol.finalize()?;
        let result = self.finish_workbook(abandoned).await;
        // Dropping the sender ends the byte stream
        self.tx = None;
        if result.is_ok() {
            tracing::debug!(bytes = self.bytes_sent, "Workbook finalized");
        }
        result
    }

    fn is_cancelled(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| tx.is_closed())
    }
}

fn sheet_path(index: usize) -> String {
    format!("xl/worksheets/sheet{}.xml", index + 1)
}

fn sheet_header() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{NS_MAIN}" xmlns:r="{NS_REL}"><sheetFormatPr defaultRowHeight="15"/><cols><col min="1" max="16384" width="{COLUMN_WIDTH}" customWidth="1"/></cols><sheetData>"#
    )
}

fn workbook_xml(names: &[String]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{NS_MAIN}" xmlns:r="{NS_REL}"><sheets>"#
    );
    for (i, name) in names.iter().enumerate() {
        xml.push_str(r#"<sheet name=""#);
        escape_xml(&mut xml, name);
        let _ = write!(xml, r#"" sheetId="{}" r:id="rId{}"/>"#, i + 1, i + 1);
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{i}" Type="{REL_WORKSHEET}" Target="worksheets/sheet{i}.xml"/>"#
        );
    }
    let _ = write!(
        xml,
        r#"<Relationship Id="rId{}" Type="{REL_STYLES}" Target="styles.xml"/></Relationships>"#,
        sheet_count + 1
    );
    xml
}

fn root_rels_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_OFFICE_DOCUMENT}" Target="xl/workbook.xml"/></Relationships>"#
    )
}

fn content_types_xml(sheet_count: usize) -> String {
    let mut xml = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
        r#"<Default Extension="xml" ContentType="application/xml"/>"#,
        r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    ));
    for i in 1..=sheet_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="{CT_WORKSHEET}"/>"#
        );
    }
    xml.push_str("</Types>");
    xml
}

fn style_index(format: CellFormat) -> u8 {
    match format {
        CellFormat::Plain => 0,
        CellFormat::Currency => 1,
        CellFormat::HyperlinkLabel => 2,
    }
}

/// Encodes one `<row>` element; empty cells are omitted
fn row_xml(out: &mut String, row: u32, cells: &[Cell]) {
    let _ = write!(out, r#"<row r="{row}">"#);
    for (col, cell) in cells.iter().enumerate() {
        if cell.is_empty() {
            continue;
        }
        let reference = format!("{}{row}", column_name(col));
        let style = match style_index(cell.format) {
            0 => String::new(),
            s => format!(r#" s="{s}""#),
        };
        match &cell.value {
            CellValue::Empty => {}
            CellValue::Text(text) => {
                let _ = write!(
                    out,
                    r#"<c r="{reference}" t="inlineStr"{style}><is><t xml:space="preserve">"#
                );
                escape_xml(out, text);
                out.push_str("</t></is></c>");
            }
            CellValue::Number(n) => {
                let _ = write!(out, r#"<c r="{reference}"{style}><v>{}</v></c>"#, n.normalize());
            }
            CellValue::Link { url, label } => {
                let formula = format!(
                    r#"HYPERLINK("{}","{}")"#,
                    url.replace('"', "\"\""),
                    label.replace('"', "\"\"")
                );
                let _ = write!(out, r#"<c r="{reference}" t="str"{style}><f>"#);
                escape_xml(out, &formula);
                out.push_str("</f><v>");
                escape_xml(out, label);
                out.push_str("</v></c>");
            }
        }
    }
    out.push_str("</row>");
}

/// Spreadsheet column name for a zero-based index (`0` is `A`, `26` is `AA`)
pub fn column_name(index: usize) -> String {
    let mut idx = index;
    let mut name = String::new();
    loop {
        name.insert(0, char::from(b'A' + (idx % 26) as u8));
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    name
}

/// Appends `text` XML-escaped, dropping characters XML 1.0 cannot carry
fn escape_xml(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    async fn collect(mut rx: mpsc::Receiver<ByteChunk>) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = rx.recv().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_escape_xml() {
        let mut out = String::new();
        escape_xml(&mut out, "Smith & <Sons> \"Co\"\u{1}");
        assert_eq!(out, "Smith &amp; &lt;Sons&gt; &quot;Co&quot;");
    }

    #[test]
    fn test_row_xml_cells() {
        let mut out = String::new();
        row_xml(
            &mut out,
            4,
            &[
                Cell::text("Cash on Hand"),
                Cell::currency(Decimal::new(123450, 2)),
                Cell::empty(),
                Cell::link("http://example.com/?a=1&b=2", "This report"),
            ],
        );
        assert!(out.starts_with(r#"<row r="4">"#));
        assert!(out.contains(r#"<c r="A4" t="inlineStr"><is><t xml:space="preserve">Cash on Hand</t></is></c>"#));
        assert!(out.contains(r#"<c r="B4" s="1"><v>1234.5</v></c>"#));
        assert!(!out.contains(r#"r="C4""#));
        assert!(out.contains(
            r#"<c r="D4" t="str" s="2"><f>HYPERLINK(&quot;http://example.com/?a=1&amp;b=2&quot;,&quot;This report&quot;)</f><v>This report</v></c>"#
        ));
    }

    #[tokio::test]
    async fn test_workbook_parts() {
        let (mut sink, rx) = XlsxSink::channel(4, 16);
        let collector = tokio::spawn(collect(rx));

        let sheet = sink.open_sheet("summary").await.unwrap();
        sink.write_row(&sheet, &[Cell::text("Friends of Testing")])
            .await
            .unwrap();
        sink.close_sheet(sheet).await.unwrap();
        let sheet = sink.open_sheet("contributions").await.unwrap();
        sink.write_row(&sheet, &[Cell::currency(Decimal::new(20000, 2))])
            .await
            .unwrap();
        sink.close_sheet(sheet).await.unwrap();
        sink.finalize().await.unwrap();

        let bytes = collector.await.unwrap();
        assert_eq!(bytes.len() as u64, sink.bytes_sent());

        let workbook = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"<sheet name="summary" sheetId="1" r:id="rId1"/>"#));
        assert!(workbook.contains(r#"<sheet name="contributions" sheetId="2" r:id="rId2"/>"#));

        let sheet2 = read_part(&bytes, "xl/worksheets/sheet2.xml");
        assert!(sheet2.contains(r#"width="20""#));
        assert!(sheet2.contains("<v>200</v>"));
        assert!(sheet2.ends_with(SHEET_FOOTER));

        let styles = read_part(&bytes, "xl/styles.xml");
        assert!(styles.contains("&quot;$&quot;#,##0.00"));
        assert!(read_part(&bytes, "[Content_Types].xml").contains("/xl/worksheets/sheet2.xml"));
    }

    #[tokio::test]
    async fn test_bytes_leave_before_finalize() {
        let (mut sink, rx) = XlsxSink::channel(1, 256);
        let collector = tokio::spawn(collect(rx));

        let sheet = sink.open_sheet("loans").await.unwrap();
        for i in 0..20_000 {
            sink.write_row(&sheet, &[Cell::text(format!("Lender {i}"))])
                .await
                .unwrap();
        }
        let sent_before_finalize = sink.bytes_sent();
        assert!(sent_before_finalize > 0);

        sink.close_sheet(sheet).await.unwrap();
        sink.finalize().await.unwrap();
        let bytes = collector.await.unwrap();
        assert!(bytes.len() as u64 > sent_before_finalize);

        let loans = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(loans.contains("Lender 0"));
        assert!(loans.contains("Lender 19999"));
    }

    #[tokio::test]
    async fn test_empty_workbook_gets_blank_sheet() {
        let (mut sink, rx) = XlsxSink::channel(4, DEFAULT_FLUSH_THRESHOLD);
        let collector = tokio::spawn(collect(rx));
        sink.finalize().await.unwrap();

        let bytes = collector.await.unwrap();
        let workbook = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="Sheet1""#));
        assert!(read_part(&bytes, "xl/worksheets/sheet1.xml").contains("<sheetData>"));
    }

    #[tokio::test]
    async fn test_finalize_closes_open_sheet() {
        let (mut sink, rx) = XlsxSink::channel(4, DEFAULT_FLUSH_THRESHOLD);
        let collector = tokio::spawn(collect(rx));
        let sheet = sink.open_sheet("loans").await.unwrap();
        sink.write_row(&sheet, &[Cell::text("x")]).await.unwrap();
        sink.finalize().await.unwrap();

        let bytes = collector.await.unwrap();
        assert!(read_part(&bytes, "xl/worksheets/sheet1.xml").ends_with(SHEET_FOOTER));
        assert!(matches!(
            sink.finalize().await,
            Err(FolioError::Sink(SinkError::AlreadyFinalized))
        ));
    }

    #[tokio::test]
    async fn test_closed_receiver_is_cancellation() {
        let (mut sink, rx) = XlsxSink::channel(1, 1);
        drop(rx);

        assert!(sink.is_cancelled());
        let sheet = sink.open_sheet("contributions").await.unwrap();
        let err = sink.write_row(&sheet, &[Cell::text("x")]).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
