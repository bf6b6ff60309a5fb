const PREAMBLE: &str = "\\documentclass{article}
\\usepackage[utf8]{inputenc}
\\usepackage{geometry}
\\geometry{a4paper, margin=1in}

\\begin{document}

";

const POSTAMBLE: &str = "\n\n\\end{document}\n";

/// Wraps `text` in a minimal LaTeX article with the text, escaped, as body.
pub fn render_tex(text: &str) -> String {
    let body = escape_latex(text);
    let mut document = String::with_capacity(PREAMBLE.len() + body.len() + POSTAMBLE.len());
    document.push_str(PREAMBLE);
    document.push_str(&body);
    document.push_str(POSTAMBLE);
    document
}

/// Escapes LaTeX special characters in a single pass.
pub fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\textbackslash{}"),
            '~' => escaped.push_str("\\textasciitilde{}"),
            '^' => escaped.push_str("\\textasciicircum{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
