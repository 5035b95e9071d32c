/// Turn a status local id into a display label.
///
/// Words are split on `-`, `_`, `.` and camel-case boundaries, then
/// capitalized: `inProgress` -> `In Progress`, `ready-to-ship` -> `Ready To Ship`.
pub fn humanize(id: &str) -> String {
  let chars: Vec<char> = id.chars().collect();
  let mut words: Vec<String> = Vec::new();
  let mut current = String::new();

  for (i, &c) in chars.iter().enumerate() {
    if matches!(c, '-' | '_' | '.' | ' ') {
      push_word(&mut words, &mut current);
      continue;
    }

    if c.is_uppercase() && !current.is_empty() {
      let prev_upper = chars[i - 1].is_uppercase();
      let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
      // "fooBar" splits before B; "HTTPServer" splits before S only.
      if !prev_upper || next_lower {
        push_word(&mut words, &mut current);
      }
    }

    current.push(c);
  }
  push_word(&mut words, &mut current);

  words
    .iter()
    .map(|word| capitalize(word))
    .collect::<Vec<_>>()
    .join(" ")
}

fn push_word(words: &mut Vec<String>, current: &mut String) {
  if !current.is_empty() {
    words.push(std::mem::take(current).to_lowercase());
  }
}

fn capitalize(word: &str) -> String {
  let mut chars = word.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}
