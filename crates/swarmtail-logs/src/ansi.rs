//! Translation of ANSI terminal escape sequences into styled segments

use ratatui::style::{Color, Modifier, Style};
use thiserror::Error;

use swarmtail_types::StyledSegment;

const ESC: char = '\u{1b}';
const BEL: char = '\u{7}';

/// Why a line could not be translated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("unterminated escape sequence at byte {0}")]
    Unterminated(usize),

    #[error("invalid color parameters '{0}'")]
    InvalidColor(String),
}

/// A line with escape sequences removed and its styled runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledText {
    pub plain: String,
    pub segments: Vec<StyledSegment>,
}

/// Current SGR attributes
#[derive(Clone, Copy, Default, PartialEq, Eq)]
struct Attributes {
    fg: Option<Color>,
    bg: Option<Color>,
    modifiers: Modifier,
}

impl Attributes {
    fn style(&self) -> Style {
        let mut style = Style::default().add_modifier(self.modifiers);
        style.fg = self.fg;
        style.bg = self.bg;
        style
    }
}

/// Translate SGR sequences into styled segments. Other CSI and OSC
/// sequences are dropped.
pub fn translate(input: &str) -> Result<StyledText, TranslateError> {
    let mut plain = String::with_capacity(input.len());
    let mut segments: Vec<StyledSegment> = Vec::new();
    let mut current = String::new();
    let mut attrs = Attributes::default();

    let mut chars = input.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        if c != ESC {
            current.push(c);
            continue;
        }

        match chars.next() {
            // CSI: ESC [ params intermediates final
            Some((_, '[')) => {
                let mut params = String::new();
                let mut final_byte = None;
                for (_, pc) in chars.by_ref() {
                    if ('\u{40}'..='\u{7e}').contains(&pc) {
                        final_byte = Some(pc);
                        break;
                    }
                    params.push(pc);
                }

                match final_byte {
                    Some('m') => {
                        let next = apply_sgr(attrs, &params)?;
                        if next != attrs {
                            flush(&mut segments, &mut plain, &mut current, attrs);
                            attrs = next;
                        }
                    }
                    Some(_) => {}
                    None => return Err(TranslateError::Unterminated(pos)),
                }
            }
            // OSC: ESC ] ... (BEL | ESC \)
            Some((_, ']')) => {
                let mut terminated = false;
                while let Some((_, oc)) = chars.next() {
                    if oc == BEL {
                        terminated = true;
                        break;
                    }
                    if oc == ESC && matches!(chars.peek(), Some((_, '\\'))) {
                        chars.next();
                        terminated = true;
                        break;
                    }
                }
                if !terminated {
                    return Err(TranslateError::Unterminated(pos));
                }
            }
            // Two-byte escapes (charset selection, keypad modes, ...)
            Some(_) => {}
            None => return Err(TranslateError::Unterminated(pos)),
        }
    }

    flush(&mut segments, &mut plain, &mut current, attrs);

    Ok(StyledText { plain, segments })
}

/// Segments covering `plain[offset..]`
pub fn segments_from(segments: &[StyledSegment], offset: usize) -> Vec<StyledSegment> {
    let mut skipped = 0;
    let mut result = Vec::new();

    for segment in segments {
        let end = skipped + segment.text.len();
        if end <= offset {
            skipped = end;
            continue;
        }

        let start = offset.saturating_sub(skipped);
        if let Some(text) = segment.text.get(start..) {
            if !text.is_empty() {
                result.push(StyledSegment::new(text, segment.style));
            }
        }
        skipped = end;
    }

    result
}

fn flush(
    segments: &mut Vec<StyledSegment>,
    plain: &mut String,
    current: &mut String,
    attrs: Attributes,
) {
    if current.is_empty() {
        return;
    }

    plain.push_str(current);
    let style = attrs.style();
    match segments.last_mut() {
        Some(last) if last.style == style => last.text.push_str(current),
        _ => segments.push(StyledSegment::new(current.as_str(), style)),
    }
    current.clear();
}

fn apply_sgr(mut attrs: Attributes, params: &str) -> Result<Attributes, TranslateError> {
    // Private-mode or intermediate bytes: not an SGR we understand
    if params.chars().any(|c| !(c.is_ascii_digit() || c == ';' || c == ':')) {
        return Ok(attrs);
    }

    let codes: Vec<u16> = if params.is_empty() {
        vec![0]
    } else {
        params
            .split([';', ':'])
            .map(|p| if p.is_empty() { Ok(0) } else { p.parse::<u16>() })
            .collect::<Result<_, _>>()
            .map_err(|_| TranslateError::InvalidColor(params.to_string()))?
    };

    let mut iter = codes.iter().copied();
    while let Some(code) = iter.next() {
        match code {
            0 => attrs = Attributes::default(),
            1 => attrs.modifiers.insert(Modifier::BOLD),
            2 => attrs.modifiers.insert(Modifier::DIM),
            3 => attrs.modifiers.insert(Modifier::ITALIC),
            4 => attrs.modifiers.insert(Modifier::UNDERLINED),
            5 => attrs.modifiers.insert(Modifier::SLOW_BLINK),
            6 => attrs.modifiers.insert(Modifier::RAPID_BLINK),
            7 => attrs.modifiers.insert(Modifier::REVERSED),
            8 => attrs.modifiers.insert(Modifier::HIDDEN),
            9 => attrs.modifiers.insert(Modifier::CROSSED_OUT),
            22 => attrs.modifiers.remove(Modifier::BOLD | Modifier::DIM),
            23 => attrs.modifiers.remove(Modifier::ITALIC),
            24 => attrs.modifiers.remove(Modifier::UNDERLINED),
            25 => attrs.modifiers.remove(Modifier::SLOW_BLINK | Modifier::RAPID_BLINK),
            27 => attrs.modifiers.remove(Modifier::REVERSED),
            28 => attrs.modifiers.remove(Modifier::HIDDEN),
            29 => attrs.modifiers.remove(Modifier::CROSSED_OUT),
            30..=37 => attrs.fg = Some(basic_color(code - 30)),
            38 => attrs.fg = Some(extended_color(&mut iter, params)?),
            39 => attrs.fg = None,
            40..=47 => attrs.bg = Some(basic_color(code - 40)),
            48 => attrs.bg = Some(extended_color(&mut iter, params)?),
            49 => attrs.bg = None,
            90..=97 => attrs.fg = Some(bright_color(code - 90)),
            100..=107 => attrs.bg = Some(bright_color(code - 100)),
            _ => {}
        }
    }

    Ok(attrs)
}

/// `5;n` (256-colour) or `2;r;g;b` (truecolour)
fn extended_color(
    iter: &mut impl Iterator<Item = u16>,
    params: &str,
) -> Result<Color, TranslateError> {
    let invalid = || TranslateError::InvalidColor(params.to_string());
    let component = |value: Option<u16>| {
        value
            .and_then(|v| u8::try_from(v).ok())
            .ok_or_else(invalid)
    };

    match iter.next() {
        Some(5) => Ok(Color::Indexed(component(iter.next())?)),
        Some(2) => {
            let r = component(iter.next())?;
            let g = component(iter.next())?;
            let b = component(iter.next())?;
            Ok(Color::Rgb(r, g, b))
        }
        _ => Err(invalid()),
    }
}

fn basic_color(index: u16) -> Color {
    match index {
        0 => Color::Black,
        1 => Color::Red,
        2 => Color::Green,
        3 => Color::Yellow,
        4 => Color::Blue,
        5 => Color::Magenta,
        6 => Color::Cyan,
        _ => Color::Gray,
    }
}

fn bright_color(index: u16) -> Color {
    match index {
        0 => Color::DarkGray,
        1 => Color::LightRed,
        2 => Color::LightGreen,
        3 => Color::LightYellow,
        4 => Color::LightBlue,
        5 => Color::LightMagenta,
        6 => Color::LightCyan,
        _ => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_one_segment() {
        let styled = translate("hello world").unwrap();
        assert_eq!(styled.plain, "hello world");
        assert_eq!(styled.segments.len(), 1);
        assert_eq!(styled.segments[0].style, Style::default());
    }

    #[test]
    fn test_colored_run() {
        let styled = translate("\x1b[31merror\x1b[0m done").unwrap();
        assert_eq!(styled.plain, "error done");
        assert_eq!(styled.segments.len(), 2);
        assert_eq!(styled.segments[0].text, "error");
        assert_eq!(styled.segments[0].style.fg, Some(Color::Red));
        assert_eq!(styled.segments[1].text, " done");
        assert_eq!(styled.segments[1].style.fg, None);
    }

    #[test]
    fn test_bold_and_extended_colors() {
        let styled = translate("\x1b[1;38;5;244mdim\x1b[22;38;2;10;20;30mrgb").unwrap();
        assert_eq!(styled.segments[0].style.fg, Some(Color::Indexed(244)));
        assert!(styled.segments[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(styled.segments[1].style.fg, Some(Color::Rgb(10, 20, 30)));
        assert!(!styled.segments[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_non_sgr_sequences_are_dropped() {
        let styled = translate("\x1b[2Kline\x1b]0;title\x07 end").unwrap();
        assert_eq!(styled.plain, "line end");
    }

    #[test]
    fn test_unterminated_sequence_fails() {
        assert_eq!(translate("oops \x1b[31"), Err(TranslateError::Unterminated(5)));
        assert!(translate("trailing \x1b").is_err());
    }

    #[test]
    fn test_invalid_extended_color_fails() {
        let err = translate("\x1b[38;5;999mx").unwrap_err();
        assert!(matches!(err, TranslateError::InvalidColor(_)));
    }

    #[test]
    fn test_segments_from_offset() {
        let styled = translate("[web] \x1b[33mwarn\x1b[0m tail").unwrap();
        let tail = segments_from(&styled.segments, 6);
        let text: String = tail.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(text, "warn tail");
        assert_eq!(tail[0].style.fg, Some(Color::Yellow));
    }
}
