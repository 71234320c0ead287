use crate::encoding::reader::BitPosition;
use crate::encoding::writer::{check_unsigned, signed_bits, ContextStack, WriteBuffer};
use crate::EncodeError;
use std::fmt;

/// Rendering knobs for [`BoxWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxOptions {
    /// Target line width in characters. Boxes wider than this still render.
    pub width: usize,
    /// Collapse a context holding a single child into that child, joining
    /// the names with `/`.
    pub merge_single_boxes: bool,
    pub omit_empty_boxes: bool,
    /// Print `pos/length` (bytes, with `.bits` remainders) under each box.
    pub pos_length_footer: bool,
}

impl Default for BoxOptions {
    fn default() -> Self {
        Self {
            width: 120,
            merge_single_boxes: false,
            omit_empty_boxes: false,
            pos_length_footer: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoxStyle {
    Heavy,
    Light,
}

impl BoxStyle {
    // upper-left, horizontal, upper-right, vertical, lower-left, lower-right
    const fn glyphs(self) -> [char; 6] {
        match self {
            Self::Heavy => ['╔', '═', '╗', '║', '╚', '╝'],
            Self::Light => ['┌', '─', '┐', '│', '└', '┘'],
        }
    }
}

/// A named, bordered block of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiBox {
    name: String,
    footer: String,
    body: Vec<String>,
    style: BoxStyle,
}

fn char_width(s: &str) -> usize {
    s.chars().count()
}

impl AsciiBox {
    fn new(name: &str, body: Vec<String>, footer: String, style: BoxStyle) -> Self {
        Self {
            name: name.to_owned(),
            footer,
            body,
            style,
        }
    }

    fn from_text(name: &str, text: &str, footer: String, style: BoxStyle) -> Self {
        Self::new(name, text.lines().map(str::to_owned).collect(), footer, style)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.body.iter().all(|line| line.trim().is_empty())
    }

    fn inner_width(&self) -> usize {
        let body = self.body.iter().map(|l| char_width(l)).max().unwrap_or(0);
        body.max(char_width(&self.name) + 1)
            .max(char_width(&self.footer) + 1)
    }

    pub fn width(&self) -> usize {
        self.inner_width() + 2
    }

    pub fn lines(&self) -> Vec<String> {
        let [ul, h, ur, v, ll, lr] = self.style.glyphs();
        let inner = self.inner_width();
        let bar = |n: usize| std::iter::repeat(h).take(n).collect::<String>();

        let mut out = Vec::with_capacity(self.body.len() + 2);
        out.push(format!(
            "{ul}{h}{}{}{ur}",
            self.name,
            bar(inner - char_width(&self.name) - 1)
        ));
        for line in &self.body {
            let pad = inner - char_width(line);
            let front = pad / 2;
            out.push(format!(
                "{v}{}{line}{}{v}",
                " ".repeat(front),
                " ".repeat(pad - front)
            ));
        }
        if self.footer.is_empty() {
            out.push(format!("{ll}{}{lr}", bar(inner)));
        } else {
            out.push(format!(
                "{ll}{}{}{h}{lr}",
                bar(inner - char_width(&self.footer) - 1),
                self.footer
            ));
        }
        out
    }
}

impl fmt::Display for AsciiBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

fn pad_to(line: &str, width: usize) -> String {
    let mut s = line.to_owned();
    s.extend(std::iter::repeat(' ').take(width.saturating_sub(char_width(line))));
    s
}

/// Packs boxes left to right, wrapping into rows of at most `width` columns,
/// and returns equal-width lines.
fn align(boxes: &[AsciiBox], width: usize) -> Vec<String> {
    let mut rows: Vec<Vec<&AsciiBox>> = Vec::new();
    let mut row_width = 0;
    for b in boxes {
        let w = b.width();
        match rows.last_mut() {
            Some(row) if row_width + w <= width => {
                row.push(b);
                row_width += w;
            }
            _ => {
                rows.push(vec![b]);
                row_width = w;
            }
        }
    }

    let mut lines = Vec::new();
    for row in rows {
        let rendered: Vec<(usize, Vec<String>)> =
            row.iter().map(|b| (b.width(), b.lines())).collect();
        let height = rendered.iter().map(|(_, l)| l.len()).max().unwrap_or(0);
        for i in 0..height {
            let mut line = String::new();
            for (w, box_lines) in &rendered {
                line.push_str(&pad_to(box_lines.get(i).map_or("", String::as_str), *w));
            }
            lines.push(line);
        }
    }
    let full = lines.iter().map(|l| char_width(l)).max().unwrap_or(0);
    lines.iter().map(|l| pad_to(l, full)).collect()
}

fn format_pos(bits: usize) -> String {
    BitPosition::from_bits(bits).to_string()
}

fn hex_dump(data: &[u8]) -> String {
    if data.is_empty() {
        return "<empty>".to_owned();
    }
    let mut out = Vec::new();
    for (i, chunk) in data.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        let ascii: String = chunk
            .iter()
            .map(|b| if (32..=126).contains(b) { *b as char } else { '.' })
            .collect();
        out.push(format!("{:03}|{} '{}'", i * 16, hex.join(" "), ascii));
    }
    out.join("\n")
}

#[derive(Debug)]
struct Frame {
    name: String,
    start: usize,
    boxes: Vec<AsciiBox>,
}

/// Renders everything written to it as nested ASCII boxes.
///
/// Contexts become heavy-bordered boxes around their children; virtual fields
/// are drawn with light borders and do not advance the position.
#[derive(Debug)]
pub struct BoxWriter {
    options: BoxOptions,
    pos: usize,
    frames: Vec<Frame>,
    contexts: ContextStack,
    root: Vec<AsciiBox>,
}

impl BoxWriter {
    pub fn new(options: BoxOptions) -> Self {
        Self {
            options,
            pos: 0,
            frames: Vec::new(),
            contexts: ContextStack::default(),
            root: Vec::new(),
        }
    }

    fn footer(&self, start: usize, bits: usize) -> String {
        if self.options.pos_length_footer {
            format!("{}/{}", format_pos(start), format_pos(bits))
        } else {
            String::new()
        }
    }

    fn available_width(&self) -> usize {
        self.options.width.saturating_sub(2 * self.frames.len())
    }

    fn emit(&mut self, b: AsciiBox) {
        if self.options.omit_empty_boxes && b.is_empty() {
            return;
        }
        match self.frames.last_mut() {
            Some(frame) => frame.boxes.push(b),
            None => self.root.push(b),
        }
    }

    fn leaf(&mut self, name: &str, text: &str, bits: usize) {
        let footer = self.footer(self.pos, bits);
        self.emit(AsciiBox::from_text(name, text, footer, BoxStyle::Heavy));
        self.pos += bits;
    }

    /// Finishes rendering, failing if any context is still open.
    pub fn into_string(self) -> Result<String, EncodeError> {
        self.contexts.finish()?;
        Ok(align(&self.root, self.options.width).join("\n"))
    }
}

impl WriteBuffer for BoxWriter {
    fn pos(&self) -> BitPosition {
        BitPosition::from_bits(self.pos)
    }

    fn write_bit(&mut self, name: &str, value: bool) -> Result<(), EncodeError> {
        self.leaf(name, &format!("b{} {value}", u8::from(value)), 1);
        Ok(())
    }

    fn write_unsigned(&mut self, name: &str, bits: u8, value: u64) -> Result<(), EncodeError> {
        check_unsigned(bits, value)?;
        let digits = (bits as usize).div_ceil(4).max(1);
        self.leaf(name, &format!("0x{value:0digits$x} {value}"), bits as usize);
        Ok(())
    }

    fn write_signed(&mut self, name: &str, bits: u8, value: i64) -> Result<(), EncodeError> {
        let raw = signed_bits(bits, value)?;
        let digits = (bits as usize).div_ceil(4);
        self.leaf(name, &format!("0x{raw:0digits$x} {value}"), bits as usize);
        Ok(())
    }

    fn write_bytes(&mut self, name: &str, data: &[u8]) -> Result<(), EncodeError> {
        self.leaf(name, &hex_dump(data), data.len() * 8);
        Ok(())
    }

    fn write_virtual(&mut self, name: &str, value: &dyn fmt::Display) -> Result<(), EncodeError> {
        let text = value.to_string();
        self.emit(AsciiBox::from_text(name, &text, String::new(), BoxStyle::Light));
        Ok(())
    }

    fn push_context(&mut self, name: &str) -> Result<(), EncodeError> {
        self.contexts.push(name);
        self.frames.push(Frame {
            name: name.to_owned(),
            start: self.pos,
            boxes: Vec::new(),
        });
        Ok(())
    }

    fn pop_context(&mut self, name: &str) -> Result<(), EncodeError> {
        self.contexts.pop(name)?;
        let Some(frame) = self.frames.pop() else {
            return Err(EncodeError::framing(format!(
                "popping context '{name}' with no open box"
            )));
        };

        if self.options.merge_single_boxes && frame.boxes.len() == 1 {
            let mut boxes = frame.boxes;
            if let Some(mut only) = boxes.pop() {
                only.name = format!("{}/{}", frame.name, only.name);
                self.emit(only);
            }
            return Ok(());
        }

        let width = self.available_width().saturating_sub(2);
        let body = align(&frame.boxes, width);
        let footer = self.footer(frame.start, self.pos - frame.start);
        self.emit(AsciiBox::new(&frame.name, body, footer, BoxStyle::Heavy));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BoxOptions, BoxWriter};
    use crate::encoding::writer::WriteBuffer;
    use crate::ErrorKind;

    #[test]
    fn renders_a_single_field() {
        let mut w = BoxWriter::new(BoxOptions::default());
        w.write_u8("x", 5).unwrap();
        assert_eq!(w.into_string().unwrap(), "╔═x════╗\n║0x05 5║\n╚══════╝");
    }

    #[test]
    fn contexts_nest_and_virtuals_use_light_borders() {
        let mut w = BoxWriter::new(BoxOptions::default());
        w.push_context("Outer").unwrap();
        w.write_unsigned("n", 4, 3).unwrap();
        w.write_virtual("double", &6).unwrap();
        w.write_unsigned("m", 4, 1).unwrap();
        w.pop_context("Outer").unwrap();
        let out = w.into_string().unwrap();
        let first = out.lines().next().unwrap();
        assert!(first.starts_with("╔═Outer"));
        assert!(out.contains("┌─double┐"));
        assert!(out.contains("0x3 3"));
        assert!(out.contains("0x1 1"));
    }

    #[test]
    fn footer_shows_position_and_length() {
        let options = BoxOptions {
            pos_length_footer: true,
            ..BoxOptions::default()
        };
        let mut w = BoxWriter::new(options);
        w.write_unsigned("nibble", 4, 1).unwrap();
        w.push_context("Ctx").unwrap();
        w.write_bytes("data", &[0xAA, 0xBB]).unwrap();
        w.pop_context("Ctx").unwrap();
        let out = w.into_string().unwrap();
        assert!(out.contains("0/0.4"));
        assert!(out.contains("0.4/2"));
    }

    #[test]
    fn merge_and_omit_options() {
        let options = BoxOptions {
            merge_single_boxes: true,
            omit_empty_boxes: true,
            ..BoxOptions::default()
        };
        let mut w = BoxWriter::new(options);
        w.push_context("Empty").unwrap();
        w.pop_context("Empty").unwrap();
        w.push_context("Outer").unwrap();
        w.write_u8("inner", 1).unwrap();
        w.pop_context("Outer").unwrap();
        let out = w.into_string().unwrap();
        assert!(out.contains("Outer/inner"));
        assert!(!out.contains("Empty"));
    }

    #[test]
    fn unbalanced_contexts_fail() {
        let mut w = BoxWriter::new(BoxOptions::default());
        w.push_context("A").unwrap();
        assert_eq!(
            w.pop_context("B").unwrap_err().kind(),
            ErrorKind::FramingViolation
        );
        assert_eq!(
            w.into_string().unwrap_err().kind(),
            ErrorKind::FramingViolation
        );
    }
}
