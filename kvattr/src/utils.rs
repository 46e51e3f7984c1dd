/// `CustomIdField` -> `custom_id_field`; also accepts already-snake or path-qualified names.
pub fn to_snake_case(input: &str) -> String {
    let name = input.rsplit("::").next().unwrap_or(input);
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                None | Some('_') => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                // acronym end: `HTTPServer` -> `http_server`
                Some(p) => p.is_uppercase() && next.is_some_and(|n| n.is_lowercase()),
            };
            if boundary {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

const UNCOUNTABLE: &[&str] =
    &["equipment", "information", "rice", "money", "species", "series", "fish", "sheep", "jeans", "police", "news", "data"];

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("sex", "sexes"),
    ("move", "moves"),
    ("zombie", "zombies"),
    ("ox", "oxen"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("goose", "geese"),
];

/// `(suffix, bytes to drop, replacement)`, first match wins.
const SUFFIXES: &[(&str, usize, &str)] = &[
    ("matrix", 2, "ices"),
    ("vertex", 2, "ices"),
    ("index", 2, "ices"),
    ("quiz", 0, "zes"),
    ("octopus", 2, "i"),
    ("virus", 2, "i"),
    ("buffalo", 0, "es"),
    ("tomato", 0, "es"),
    ("potato", 0, "es"),
    ("hero", 0, "es"),
    ("mouse", 4, "ice"),
    ("louse", 4, "ice"),
    ("axis", 2, "es"),
    ("testis", 2, "es"),
    ("sis", 2, "es"),
    ("tum", 2, "a"),
    ("ium", 2, "a"),
    ("quy", 1, "ies"),
    ("ffe", 0, "s"),
    ("fe", 2, "ves"),
    ("lf", 1, "ves"),
    ("rf", 1, "ves"),
];

/// English plural with the common irregular and uncountable words; `Person` -> `People`.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if !word.is_ascii() {
        return format!("{}s", word);
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
        return match word.chars().next() {
            Some(first) if first.is_uppercase() => {
                let mut capitalized = plural[..1].to_uppercase();
                capitalized.push_str(&plural[1..]);
                capitalized
            }
            _ => plural.to_string(),
        };
    }
    if let Some((_, drop, replacement)) = SUFFIXES.iter().find(|(suffix, _, _)| lower.ends_with(suffix)) {
        return format!("{}{}", &word[..word.len() - drop], replacement);
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| lower.ends_with(suffix)) {
        return format!("{}es", word);
    }
    let mut chars = lower.chars().rev();
    if let (Some('y'), Some(prev)) = (chars.next(), chars.next()) {
        if !"aeiou".contains(prev) {
            return format!("{}ies", &word[..word.len() - 1]);
        }
    }
    format!("{}s", word)
}

/// Key namespace of a model name, `Post` -> `posts`, `CustomIdField` -> `custom_id_fields`.
pub fn tableize(model: &str) -> String {
    let snake = to_snake_case(model);
    match snake.rfind('_') {
        Some(pos) => format!("{}{}", &snake[..=pos], pluralize(&snake[pos + 1..])),
        None => pluralize(&snake),
    }
}
