//! Minimal PDF 1.4 writer for run reports.
//!
//! Text-only output with the standard Helvetica fonts on US Letter pages,
//! so no font embedding or external renderer is required.

use std::fmt::Write as _;

use crate::models::TestReportResponse;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 36.0;
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;

const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 10.0;
const TABLE_SIZE: f32 = 8.0;

/// Step table columns: header and width in points.
const STEP_COLUMNS: [(&str, f32); 5] = [
    ("Step #", 44.0),
    ("Description", 150.0),
    ("Status", 60.0),
    ("Message", 190.0),
    ("Timestamp", 96.0),
];

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Remove `<...>` markup from a message.
pub fn strip_html_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Escape a string for a PDF literal. Characters outside printable ASCII become `?`.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Greedy word wrap to a character budget; overlong words are split.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn chars_for(width: f32, size: f32) -> usize {
    (width / (size * GLYPH_WIDTH)).floor() as usize
}

/// Lays text out top to bottom, starting a new page when space runs out.
struct Layout {
    pages: Vec<String>,
    current: String,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: String::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN && !self.current.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn text_at(&mut self, x: f32, y: f32, font: Font, size: f32, text: &str) {
        let _ = writeln!(
            self.current,
            "BT /{} {} Tf {:.2} {:.2} Td ({}) Tj ET",
            font.resource(),
            size,
            x,
            y,
            escape(text)
        );
    }

    /// Wrapped paragraph across the full text width.
    fn paragraph(&mut self, font: Font, size: f32, text: &str) {
        let leading = size * 1.25;
        for line in wrap(text, chars_for(PAGE_WIDTH - 2.0 * MARGIN, size)) {
            self.ensure_space(leading);
            self.y -= leading;
            let y = self.y;
            self.text_at(MARGIN, y, font, size, &line);
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    /// One table row; every cell wraps within its column.
    fn row(&mut self, font: Font, cells: &[String]) {
        let leading = TABLE_SIZE * 1.25;
        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .zip(STEP_COLUMNS.iter())
            .map(|(cell, (_, width))| wrap(cell, chars_for(*width - 4.0, TABLE_SIZE)))
            .collect();
        let height = wrapped.iter().map(Vec::len).max().unwrap_or(1) as f32 * leading;

        self.ensure_space(height + 4.0);
        let top = self.y;
        let mut x = MARGIN;
        for (lines, (_, width)) in wrapped.iter().zip(STEP_COLUMNS.iter()) {
            for (i, line) in lines.iter().enumerate() {
                self.text_at(x + 2.0, top - leading * (i as f32 + 1.0), font, TABLE_SIZE, line);
            }
            x += width;
        }
        self.y = top - height - 4.0;
    }

    fn finish(mut self) -> Vec<String> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Serialize page content streams into a complete document.
fn assemble(pages: &[String]) -> Vec<u8> {
    let page_count = pages.len();
    // 1 catalog, 2 page tree, 3-4 fonts, then a (page, content) pair per page
    let first_page_obj = 5;
    let page_obj = |i: usize| first_page_obj + 2 * i;

    let mut objects: Vec<String> = Vec::with_capacity(4 + 2 * page_count);
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", page_obj(i))).collect();
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        page_count
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold >>".to_string());

    for (i, content) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH,
            PAGE_HEIGHT,
            page_obj(i) + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{}\nendobj\n", i + 1, body);
    }

    let xref_at = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(out, "{:010} 00000 n \n", offset);
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    );

    out.into_bytes()
}

/// Render runs as a PDF: a header block per run and, if `detailed`, a step table.
pub fn render_report(runs: &[TestReportResponse], detailed: bool) -> Vec<u8> {
    let mut layout = Layout::new();

    layout.paragraph(Font::Bold, TITLE_SIZE, "Test Reports");
    layout.gap(18.0);

    if runs.is_empty() {
        layout.paragraph(Font::Regular, BODY_SIZE, "No test reports matched the export filters.");
    }

    for (idx, run) in runs.iter().enumerate() {
        layout.paragraph(Font::Bold, BODY_SIZE, &format!("Test #{}", idx + 1));
        layout.paragraph(Font::Regular, BODY_SIZE, &format!("Name: {}", run.test_name));
        layout.paragraph(Font::Regular, BODY_SIZE, &format!("Status: {}", run.status));
        layout.paragraph(
            Font::Regular,
            BODY_SIZE,
            &format!("Execution Time: {}s", run.execution_time),
        );
        layout.paragraph(
            Font::Regular,
            BODY_SIZE,
            &format!("Timestamp: {}", run.timestamp.format("%d/%m/%Y %H:%M:%S")),
        );
        let suite = match (&run.test_suite_name, run.test_suite_id) {
            (Some(name), Some(id)) => format!("{} ({})", name, id),
            (None, Some(id)) => id.to_string(),
            _ => String::new(),
        };
        layout.paragraph(Font::Regular, BODY_SIZE, &format!("Suite: {}", suite));
        layout.gap(8.0);

        if detailed && !run.steps.is_empty() {
            let header: Vec<String> = STEP_COLUMNS.iter().map(|(h, _)| h.to_string()).collect();
            layout.row(Font::Bold, &header);
            for step in &run.steps {
                layout.row(
                    Font::Regular,
                    &[
                        step.step_number.to_string(),
                        step.step_description.clone(),
                        step.step_status.clone(),
                        strip_html_tags(step.error_message.as_deref().unwrap_or_default()),
                        step.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    ],
                );
            }
            layout.gap(12.0);
        } else {
            layout.gap(8.0);
        }
    }

    assemble(&layout.finish())
}
