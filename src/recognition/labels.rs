/// Parses a class-label file, one class per line.
///
/// Accepts plain names (`tench`), WordNet-prefixed lines (`n01440764 tench, Tinca tinca`)
/// and keeps only the first synonym.
pub fn parse_labels(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let name = match line.split_once(char::is_whitespace) {
                Some((head, rest)) if is_synset_id(head) => rest.trim(),
                _ => line,
            };
            name.split(',').next().unwrap_or(name).trim().to_string()
        })
        .collect()
}

fn is_synset_id(token: &str) -> bool {
    token.len() == 9 && token.starts_with('n') && token[1..].chars().all(|c| c.is_ascii_digit())
}

/// `running_shoe` -> `Running Shoe`.
pub fn humanize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut previous_alphabetic = false;

    for c in label.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if previous_alphabetic {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_alphabetic = true;
        } else {
            out.push(c);
            previous_alphabetic = false;
        }
    }

    out
}
