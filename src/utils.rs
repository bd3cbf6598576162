use crate::lexer::Region;
use miette::SourceSpan;

/// Calculates the byte offset of a 1-based line and column in the source text,
/// counting columns the same way the lexer does (a tab is four columns wide).
/// This is meant for error reporting only, as it walks the text from the start.
pub fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let mut current_line = 1;
    let mut current_column = 1;
    for (offset, c) in source.char_indices() {
        if current_line == line && current_column >= column {
            return offset;
        }
        if current_line > line {
            return offset;
        }
        match c {
            '\n' => {
                current_line += 1;
                current_column = 1;
            }
            '\r' => current_column = 1,
            '\t' => current_column += 4,
            _ => current_column += 1,
        }
    }
    source.len()
}

/// Converts an inclusive line/column region into a byte span of the source.
pub fn span_of(source: &str, region: &Region) -> SourceSpan {
    let start = offset_of(source, region.start_line, region.start_col);
    let end_char = offset_of(source, region.end_line, region.end_col);
    let end = source[end_char..]
        .chars()
        .next()
        .map_or(end_char, |c| end_char + c.len_utf8());
    (start, end.saturating_sub(start)).into()
}
