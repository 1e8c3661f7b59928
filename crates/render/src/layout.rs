//! Text layout: greedy line breaking, vertical columns and anchoring.
//!
//! All positions are in scaled pixels relative to the top-left corner of
//! the text box. Rotation is not applied here.

use crate::font::{FontRequest, TextMeasure};
use deck_core::{Alignment, Anchor, FlowDirection, Paragraph, Run, RunStyle, TextBody};

/// A measured fragment of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutToken {
    pub text: String,
    pub style: RunStyle,
    /// Pure whitespace; decorations that skip gaps check this.
    pub is_whitespace: bool,
    pub width: f32,
}

impl LayoutToken {
    fn new(text: String, style: RunStyle, measure: &dyn TextMeasure) -> Self {
        let is_newline = text == "\n";
        let width = if is_newline {
            0.0
        } else {
            measure.measure(&text, FontRequest::from(&style))
        };
        Self {
            is_whitespace: text.chars().all(char::is_whitespace),
            text,
            style,
            width,
        }
    }

    pub fn is_newline(&self) -> bool {
        self.text == "\n"
    }
}

/// One wrapped line of horizontal text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutLine {
    pub tokens: Vec<LayoutToken>,
    pub width: f32,
    pub height: f32,
}

impl LayoutLine {
    fn push(&mut self, token: LayoutToken) {
        self.width += token.width;
        self.height = self.height.max(token.style.line_height());
        self.tokens.push(token);
    }

    /// Largest font size on the line; the baseline sits this far below the
    /// line top.
    fn ascent(&self) -> f32 {
        self.tokens
            .iter()
            .map(|t| t.style.font_size)
            .fold(0.0, f32::max)
            .max(self.height / deck_core::types::LINE_HEIGHT_FACTOR)
    }
}

/// One column of vertical text; each token is a single character.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutColumn {
    pub tokens: Vec<LayoutToken>,
    pub width: f32,
    pub height: f32,
}

/// Layout of one paragraph.
#[derive(Debug, Clone, PartialEq)]
pub enum ParagraphLayout {
    Lines(Vec<LayoutLine>),
    Columns(Vec<LayoutColumn>),
}

impl ParagraphLayout {
    /// Number of lines or columns.
    pub fn len(&self) -> usize {
        match self {
            ParagraphLayout::Lines(lines) => lines.len(),
            ParagraphLayout::Columns(columns) => columns.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Height this paragraph occupies, without paragraph spacing.
    pub fn block_height(&self, line_spacing: f32) -> f32 {
        match self {
            ParagraphLayout::Lines(lines) => {
                lines.iter().map(|line| line.height * line_spacing).sum()
            }
            // Cells are already spaced; the multiplier applies to the block
            // once more, as it does for a paragraph's contribution.
            ParagraphLayout::Columns(columns) => {
                columns.iter().map(|c| c.height).fold(0.0, f32::max) * line_spacing
            }
        }
    }
}

/// A token with its final position inside the box.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedToken {
    pub token: LayoutToken,
    pub x: f32,
    pub baseline: f32,
}

/// Complete layout of a text body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyLayout {
    pub paragraphs: Vec<ParagraphLayout>,
    /// Height of all paragraphs including spacing, before justification.
    pub content_height: f32,
    /// Offset of the first paragraph from the box top.
    pub start_y: f32,
    /// Extra space inserted between adjacent lines, or after every character
    /// of a column, for justified anchoring.
    pub extra_gap: f32,
    pub placed: Vec<PlacedToken>,
}

/// Split runs into whitespace and non-whitespace fragments. Every line
/// break becomes its own `"\n"` token.
pub fn tokenize(runs: &[Run], measure: &dyn TextMeasure) -> Vec<LayoutToken> {
    let mut tokens = Vec::new();

    for run in runs {
        let text = run.text.replace("\r\n", "\n").replace('\r', "\n");
        let mut current = String::new();
        let mut current_is_space = false;

        for c in text.chars() {
            if c == '\n' {
                if !current.is_empty() {
                    tokens.push(LayoutToken::new(std::mem::take(&mut current), run.style, measure));
                }
                tokens.push(LayoutToken::new("\n".to_string(), run.style, measure));
                continue;
            }
            let is_space = c.is_whitespace();
            if !current.is_empty() && is_space != current_is_space {
                tokens.push(LayoutToken::new(std::mem::take(&mut current), run.style, measure));
            }
            current_is_space = is_space;
            current.push(c);
        }

        if !current.is_empty() {
            tokens.push(LayoutToken::new(current, run.style, measure));
        }
    }

    tokens
}

/// Greedy line breaking into a box of `width` pixels.
///
/// A token that would overflow starts a new line unless the line is still
/// empty, so an oversized token sits alone. Whitespace at a wrap point is
/// dropped.
pub fn layout_lines(runs: &[Run], width: f32, measure: &dyn TextMeasure) -> Vec<LayoutLine> {
    let mut lines = Vec::new();
    let mut current = LayoutLine::default();

    for token in tokenize(runs, measure) {
        if token.is_newline() {
            let mut line = std::mem::take(&mut current);
            if line.tokens.is_empty() {
                line.height = token.style.line_height();
            }
            lines.push(line);
            continue;
        }

        if !current.tokens.is_empty() && current.width + token.width > width {
            lines.push(std::mem::take(&mut current));
            if token.is_whitespace {
                continue;
            }
        }
        current.push(token);
    }

    if !current.tokens.is_empty() {
        lines.push(current);
    }
    lines
}

/// Character-by-character columns into a box of `height` pixels.
pub fn layout_columns(
    runs: &[Run],
    height: f32,
    line_spacing: f32,
    measure: &dyn TextMeasure,
) -> Vec<LayoutColumn> {
    let mut columns = Vec::new();
    let mut current = LayoutColumn::default();

    for token in tokenize(runs, measure) {
        if token.is_newline() {
            if !current.tokens.is_empty() {
                columns.push(std::mem::take(&mut current));
            }
            continue;
        }

        for c in token.text.chars() {
            let cell = LayoutToken::new(c.to_string(), token.style, measure);
            let cell_height = cell.style.line_height() * line_spacing;
            if !current.tokens.is_empty() && current.height + cell_height > height {
                columns.push(std::mem::take(&mut current));
            }
            current.height += cell_height;
            current.width = current.width.max(cell.width);
            current.tokens.push(cell);
        }
    }

    if !current.tokens.is_empty() {
        columns.push(current);
    }
    columns
}

/// Lay out a whole text body inside a `width` x `height` box.
pub fn layout_body(
    body: &TextBody,
    width: f32,
    height: f32,
    measure: &dyn TextMeasure,
) -> BodyLayout {
    let vertical = body.flow.is_vertical();
    let paragraphs: Vec<ParagraphLayout> = body
        .paragraphs
        .iter()
        .map(|p| {
            if vertical {
                ParagraphLayout::Columns(layout_columns(&p.runs, height, p.line_spacing, measure))
            } else {
                ParagraphLayout::Lines(layout_lines(&p.runs, width, measure))
            }
        })
        .collect();

    let count = paragraphs.len();
    let content_height: f32 = body
        .paragraphs
        .iter()
        .zip(&paragraphs)
        .enumerate()
        .map(|(i, (p, layout))| {
            let gap = if i + 1 < count { p.gap() } else { 0.0 };
            p.space_before + layout.block_height(p.line_spacing) + p.space_after + gap
        })
        .sum();

    let start_y = match body.anchor {
        Anchor::Top | Anchor::Justify => 0.0,
        Anchor::Center => ((height - content_height) / 2.0).max(0.0),
        Anchor::Bottom => (height - content_height).max(0.0),
    };

    let slots: usize = paragraphs.iter().map(ParagraphLayout::len).sum();
    let extra_gap = if body.anchor == Anchor::Justify && slots > 1 {
        ((height - content_height) / (slots - 1) as f32).max(0.0)
    } else {
        0.0
    };

    let mut layout = BodyLayout {
        paragraphs,
        content_height,
        start_y,
        extra_gap,
        placed: Vec::new(),
    };
    layout.placed = place(body, &layout, width, height);
    layout
}

fn align_offset(align: Alignment, box_width: f32, used: f32) -> f32 {
    match align {
        Alignment::Left | Alignment::Justify => 0.0,
        Alignment::Center => (box_width - used) / 2.0,
        Alignment::Right => box_width - used,
    }
}

fn place(body: &TextBody, layout: &BodyLayout, width: f32, height: f32) -> Vec<PlacedToken> {
    let mut placed = Vec::new();
    let mut y = layout.start_y;
    let total_lines: usize = layout.paragraphs.iter().map(ParagraphLayout::len).sum();
    let mut line_index = 0;
    let count = body.paragraphs.len();

    for (i, (paragraph, paragraph_layout)) in body.paragraphs.iter().zip(&layout.paragraphs).enumerate() {
        let is_last = i + 1 == count;
        y += paragraph.space_before;

        match paragraph_layout {
            ParagraphLayout::Lines(lines) => {
                for line in lines {
                    let mut x = align_offset(paragraph.align, width, line.width);
                    let baseline = y + line.ascent();
                    for token in &line.tokens {
                        placed.push(PlacedToken {
                            token: token.clone(),
                            x,
                            baseline,
                        });
                        x += token.width;
                    }
                    y += line.height * paragraph.line_spacing;
                    line_index += 1;
                    if line_index < total_lines {
                        y += layout.extra_gap;
                    }
                }
                y += paragraph.space_after;
            }
            ParagraphLayout::Columns(columns) => {
                let extra = layout.extra_gap;
                place_columns(paragraph, columns, body.flow, width, y, extra, &mut placed);
                let longest = columns.iter().map(|c| c.tokens.len()).max().unwrap_or(0);
                let block = paragraph_layout.block_height(paragraph.line_spacing);
                let stretched = block + extra * longest.saturating_sub(1) as f32;
                y += if extra > 0.0 { stretched.min(height) } else { block };
                y += paragraph.space_after;
            }
        }

        if !is_last {
            y += paragraph.gap();
        }
    }

    placed
}

fn place_columns(
    paragraph: &Paragraph,
    columns: &[LayoutColumn],
    flow: FlowDirection,
    width: f32,
    top: f32,
    extra_gap: f32,
    placed: &mut Vec<PlacedToken>,
) {
    let total_width: f32 = columns.iter().map(|c| c.width).sum();
    let start = align_offset(paragraph.align, width, total_width);
    let right_to_left = flow == FlowDirection::VerticalRightToLeft;
    let mut cursor_x = if right_to_left { start + total_width } else { start };

    for column in columns {
        if right_to_left {
            cursor_x -= column.width;
        }
        let mut cursor_y = top;
        for token in &column.tokens {
            placed.push(PlacedToken {
                token: token.clone(),
                x: cursor_x + (column.width - token.width) / 2.0,
                baseline: cursor_y + token.style.font_size,
            });
            cursor_y += token.style.line_height() * paragraph.line_spacing + extra_gap;
        }
        if !right_to_left {
            cursor_x += column.width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FixedAdvance;
    use deck_core::{Rgb, UnderlineKind};

    fn style(size: f32) -> RunStyle {
        RunStyle {
            font_size: size,
            color: Rgb::DEFAULT_TEXT,
            underline: UnderlineKind::None,
            underline_color: Rgb::DEFAULT_TEXT,
            strike: false,
            strike_color: Rgb::DEFAULT_TEXT,
            bold: false,
            italic: false,
            outline: None,
        }
    }

    fn run(text: &str, size: f32) -> Run {
        Run {
            text: text.to_string(),
            style: style(size),
        }
    }

    fn paragraph(runs: Vec<Run>, align: Alignment) -> Paragraph {
        Paragraph {
            runs,
            align,
            line_spacing: 1.0,
            space_before: 0.0,
            space_after: 0.0,
            gap_ratio: None,
            default_style: style(20.0),
        }
    }

    fn body(paragraphs: Vec<Paragraph>, anchor: Anchor, flow: FlowDirection) -> TextBody {
        TextBody {
            paragraphs,
            anchor,
            flow,
        }
    }

    fn texts(line: &LayoutLine) -> Vec<&str> {
        line.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    const FIXED: FixedAdvance = FixedAdvance { em_ratio: 0.5 };

    #[test]
    fn test_tokenize_splits_whitespace_and_newlines() {
        let tokens = tokenize(&[run("Hello  big\r\nworld", 10.0)], &FIXED);
        let parts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(parts, vec!["Hello", "  ", "big", "\n", "world"]);
        assert!(tokens[1].is_whitespace);
        assert!(!tokens[0].is_whitespace);
        assert_eq!(tokens[0].width, 25.0);
        assert_eq!(tokens[3].width, 0.0);
    }

    #[test]
    fn test_hello_world_centered() {
        let text = body(
            vec![paragraph(vec![run("Hello world", 20.0)], Alignment::Center)],
            Anchor::Top,
            FlowDirection::Horizontal,
        );
        let layout = layout_body(&text, 400.0, 300.0, &FIXED);

        let ParagraphLayout::Lines(lines) = &layout.paragraphs[0] else {
            panic!("expected lines");
        };
        assert_eq!(lines.len(), 1);
        let line_width = lines[0].width;
        assert_eq!(line_width, 110.0);
        assert_eq!(layout.placed[0].x, (400.0 - line_width) / 2.0);
        assert_eq!(layout.placed[0].baseline, 20.0);
    }

    #[test]
    fn test_greedy_lines_stay_within_width() {
        let runs = [run("the quick brown fox jumps over the lazy dog again", 10.0)];
        let lines = layout_lines(&runs, 60.0, &FIXED);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.width <= 60.0 || line.tokens.len() == 1, "{:?}", texts(line));
        }
        assert!(lines.iter().all(|l| !l.tokens[0].is_whitespace));
    }

    #[test]
    fn test_oversized_token_sits_alone() {
        let lines = layout_lines(&[run("a supercalifragilistic b", 10.0)], 40.0, &FIXED);
        let words: Vec<Vec<&str>> = lines.iter().map(texts).collect();
        assert_eq!(words, vec![vec!["a", " "], vec!["supercalifragilistic"], vec!["b"]]);
        assert!(lines[1].width > 40.0);
    }

    #[test]
    fn test_newline_forces_break_and_keeps_blank_lines() {
        let lines = layout_lines(&[run("one\n\ntwo\n", 16.0)], 1000.0, &FIXED);
        assert_eq!(lines.len(), 3);
        assert_eq!(texts(&lines[0]), vec!["one"]);
        assert!(lines[1].tokens.is_empty());
        assert_eq!(lines[1].height, 20.0);
        assert_eq!(texts(&lines[2]), vec!["two"]);
    }

    #[test]
    fn test_line_height_is_largest_token() {
        let lines = layout_lines(&[run("small ", 10.0), run("BIG", 40.0)], 1000.0, &FIXED);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].height, 50.0);
    }

    #[test]
    fn test_anchor_offsets() {
        let make = |anchor| {
            body(
                vec![paragraph(vec![run("x", 16.0)], Alignment::Left)],
                anchor,
                FlowDirection::Horizontal,
            )
        };
        // One line of 16px text is 20px tall.
        assert_eq!(layout_body(&make(Anchor::Top), 100.0, 100.0, &FIXED).start_y, 0.0);
        assert_eq!(layout_body(&make(Anchor::Center), 100.0, 100.0, &FIXED).start_y, 40.0);
        assert_eq!(layout_body(&make(Anchor::Bottom), 100.0, 100.0, &FIXED).start_y, 80.0);
        // Overflowing content never starts above the box.
        assert_eq!(layout_body(&make(Anchor::Bottom), 100.0, 5.0, &FIXED).start_y, 0.0);
    }

    #[test]
    fn test_paragraph_gap_only_between_paragraphs() {
        let mut first = paragraph(vec![run("a", 16.0)], Alignment::Left);
        first.space_before = 4.0;
        first.space_after = 6.0;
        let mut second = paragraph(vec![run("b", 16.0)], Alignment::Left);
        second.gap_ratio = Some(1.0);
        let text = body(vec![first, second], Anchor::Top, FlowDirection::Horizontal);

        let layout = layout_body(&text, 100.0, 500.0, &FIXED);
        // 4 + 20 + 6 + 0.35 * 20, then 20 with no trailing gap.
        assert!((layout.content_height - 57.0).abs() < 1e-4);
        assert!((layout.placed[1].baseline - (4.0 + 20.0 + 6.0 + 7.0 + 16.0)).abs() < 1e-4);
    }

    #[test]
    fn test_justify_fills_box() {
        let text = body(
            vec![
                paragraph(vec![run("a\nb", 16.0)], Alignment::Left),
                paragraph(vec![run("c", 16.0)], Alignment::Left),
            ],
            Anchor::Justify,
            FlowDirection::Horizontal,
        );
        let layout = layout_body(&text, 100.0, 200.0, &FIXED);
        // Three lines of 20px plus one 7px paragraph gap.
        assert!((layout.content_height - 67.0).abs() < 1e-4);
        assert!((layout.extra_gap - 66.5).abs() < 1e-4);
        let last = layout.placed.last().unwrap();
        // Bottom of the last line lands on the box bottom.
        assert!((last.baseline + 4.0 - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_justify_single_line_has_no_extra_gap() {
        let text = body(
            vec![paragraph(vec![run("only", 16.0)], Alignment::Left)],
            Anchor::Justify,
            FlowDirection::Horizontal,
        );
        assert_eq!(layout_body(&text, 100.0, 200.0, &FIXED).extra_gap, 0.0);
    }

    #[test]
    fn test_vertical_columns_wrap_by_height() {
        let columns = layout_columns(&[run("abcde", 16.0)], 45.0, 1.0, &FIXED);
        let sizes: Vec<usize> = columns.iter().map(|c| c.tokens.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(columns[0].height, 40.0);
        assert_eq!(columns[0].width, 8.0);
    }

    #[test]
    fn test_vertical_direction_orders_columns() {
        let make = |flow| {
            body(
                vec![paragraph(vec![run("abcd", 16.0)], Alignment::Left)],
                Anchor::Top,
                flow,
            )
        };
        let ltr = layout_body(&make(FlowDirection::VerticalTopToBottom), 100.0, 45.0, &FIXED);
        let rtl = layout_body(&make(FlowDirection::VerticalRightToLeft), 100.0, 45.0, &FIXED);

        // "a" opens the first column in both directions.
        assert_eq!(ltr.placed[0].x, 0.0);
        assert_eq!(rtl.placed[0].x, 8.0);
        assert_eq!(ltr.placed[2].x, 8.0);
        assert_eq!(rtl.placed[2].x, 0.0);
        assert_eq!(ltr.placed[1].baseline, 36.0);
    }

    #[test]
    fn test_vertical_block_height_applies_line_spacing() {
        let mut p = paragraph(vec![run("ab", 16.0)], Alignment::Left);
        p.line_spacing = 2.0;
        let text = body(vec![p], Anchor::Center, FlowDirection::VerticalTopToBottom);
        let layout = layout_body(&text, 100.0, 200.0, &FIXED);

        // One column of two 40px cells, scaled again by the multiplier.
        assert_eq!(layout.content_height, 160.0);
        assert_eq!(layout.start_y, 20.0);
        assert_eq!(layout.placed[0].baseline, 36.0);
    }

    #[test]
    fn test_vertical_justify_spreads_characters() {
        let text = body(
            vec![paragraph(vec![run("abcdefgh", 16.0)], Alignment::Left)],
            Anchor::Justify,
            FlowDirection::VerticalTopToBottom,
        );
        let layout = layout_body(&text, 100.0, 70.0, &FIXED);

        assert_eq!(layout.paragraphs[0].len(), 3);
        assert_eq!(layout.content_height, 60.0);
        // Three columns share the 10px of slack.
        assert_eq!(layout.extra_gap, 5.0);
        let baselines: Vec<f32> = layout.placed[..3].iter().map(|p| p.baseline).collect();
        assert_eq!(baselines, vec![16.0, 41.0, 66.0]);
        // The next column starts again at the top.
        assert_eq!(layout.placed[3].baseline, 16.0);
        assert_eq!(layout.placed[3].x, 8.0);
    }

    #[test]
    fn test_line_spacing_scales_advance() {
        let mut p = paragraph(vec![run("a\nb", 16.0)], Alignment::Left);
        p.line_spacing = 1.5;
        let text = body(vec![p], Anchor::Top, FlowDirection::Horizontal);
        let layout = layout_body(&text, 100.0, 200.0, &FIXED);
        assert_eq!(layout.content_height, 60.0);
        assert_eq!(layout.placed[1].baseline - layout.placed[0].baseline, 30.0);
    }
}
