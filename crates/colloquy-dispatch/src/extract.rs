use colloquy_core::config::ExtractionStrategy;

const ANSWER_MARKERS: [&str; 2] = ["answer:", "a:"];

/// Pick the answer line out of a passage. `None` means the passage holds no usable answer.
pub fn extract_answer(text: &str, strategy: ExtractionStrategy) -> Option<String> {
    match strategy {
        ExtractionStrategy::QaLines => answer_after_question(text),
        ExtractionStrategy::RawPassage => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
}

/// Scan Q/A formatted text: the first non-question line after a question wins.
/// Without any question the last non-blank line is used.
fn answer_after_question(text: &str) -> Option<String> {
    let mut question_found = false;
    let mut best: Option<&str> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if is_question(line) {
            question_found = true;
            continue;
        }
        best = Some(line);
        if question_found {
            break;
        }
    }

    let answer = strip_marker(best?).trim();
    (!answer.is_empty()).then(|| answer.to_string())
}

fn is_question(line: &str) -> bool {
    line.contains('?') || line.contains("<h1")
}

fn strip_marker(line: &str) -> &str {
    for marker in ANSWER_MARKERS {
        let matches = line
            .get(..marker.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(marker));
        if matches {
            return &line[marker.len()..];
        }
    }
    line
}
