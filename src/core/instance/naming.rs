// Directory names for new builds: ASCII only, unique among existing ones.

fn transliterate(c: char) -> Option<&'static str> {
    let mapped = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "c",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ь' | 'ъ' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        '-' => "_",
        _ => return None,
    };
    Some(mapped)
}

/// `name` reduced to `[A-Za-z0-9_]`, with Cyrillic transliterated and
/// whitespace runs collapsed to `_`.
pub fn sanitize_dir_name(name: &str) -> String {
    let mut converted = String::with_capacity(name.len());
    for c in name.chars() {
        let lower = c.to_lowercase().next().unwrap_or(c);
        match transliterate(lower) {
            Some(mapped) => converted.push_str(mapped),
            None => converted.push(c),
        }
    }

    let mut out = String::with_capacity(converted.len());
    let mut in_space = false;
    for c in converted.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        }
    }
    out
}

/// First of `base`, `base_1`, `base_2`, ... for which `taken` is false.
pub fn unique_dir_name(name: &str, taken: impl Fn(&str) -> bool) -> String {
    let base = match sanitize_dir_name(name) {
        s if s.is_empty() => "instance".to_string(),
        s => s,
    };

    let mut candidate = base.clone();
    let mut counter = 1;
    while taken(&candidate) {
        candidate = format!("{}_{}", base, counter);
        counter += 1;
    }
    candidate
}
