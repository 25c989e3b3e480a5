//! Fenced code block tracking.
//!
//! A fence line is up to three whitespace characters of indent followed by a run of
//! at least three backticks or three tildes. Anything after the run (an info
//! string, more markers) is ignored. Closing only needs the same marker
//! family as the opener; run length is not compared.

/// Which character a fence is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceFamily {
    Backtick,
    Tilde,
}

/// What a single line did to the fence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceEvent {
    Open,
    Close,
    /// Ordinary line, or a marker of the other family inside a fence.
    None,
}

/// Two-state machine: outside any fence, or inside one of a given family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FenceState {
    #[default]
    Outside,
    Inside(FenceFamily),
}

impl FenceState {
    pub fn is_inside(self) -> bool {
        matches!(self, FenceState::Inside(_))
    }

    /// Feed one line (without its newline) and advance.
    pub fn step(&mut self, line: &str) -> FenceEvent {
        let Some(family) = fence_marker(line) else {
            return FenceEvent::None;
        };
        match *self {
            FenceState::Outside => {
                *self = FenceState::Inside(family);
                FenceEvent::Open
            }
            FenceState::Inside(open) if open == family => {
                *self = FenceState::Outside;
                FenceEvent::Close
            }
            FenceState::Inside(_) => FenceEvent::None,
        }
    }
}

/// Byte offset where the indent ends, or `None` when the line is indented
/// by more than three whitespace characters.
pub(crate) fn indent_end(line: &str) -> Option<usize> {
    let mut count = 0;
    for (i, c) in line.char_indices() {
        if !c.is_whitespace() {
            return Some(i);
        }
        count += 1;
        if count > 3 {
            return None;
        }
    }
    Some(line.len())
}

/// Returns the marker family if `line` starts a fence delimiter.
pub fn fence_marker(line: &str) -> Option<FenceFamily> {
    let rest = line[indent_end(line)?..].as_bytes();
    let (family, byte) = match rest.first()? {
        b'`' => (FenceFamily::Backtick, b'`'),
        b'~' => (FenceFamily::Tilde, b'~'),
        _ => return None,
    };
    let run = rest.iter().take_while(|&&b| b == byte).count();
    (run >= 3).then_some(family)
}
