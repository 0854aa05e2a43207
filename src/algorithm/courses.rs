// Course-code parsing helpers. Codes look like "CPSC 260", "BIOL 105L":
// an uppercase subject, an optional space, a number, an optional lab suffix.

/// Subjects whose lecture courses carry a paired `L` lab section.
pub const LAB_SUBJECTS: [&str; 3] = ["BIOL", "CHEM", "PHYS"];

/// Split a course code into (subject, number, is_lab). Anything after the
/// optional lab suffix is ignored. Returns `None` when the code does not
/// start with letters followed by digits.
pub fn parse_course_code(code: &str) -> Option<(String, u32, bool)> {
    let code = code.trim();
    let subject: String = code
        .chars()
        .take_while(|c| c.is_ascii_uppercase())
        .collect();
    if subject.is_empty() {
        return None;
    }
    let rest = code[subject.len()..].trim_start();
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let number: u32 = digits.parse().ok()?;
    let is_lab = rest[digits.len()..].starts_with('L');
    Some((subject, number, is_lab))
}

/// Subject and hundreds level of a course ("CPSC 223" -> ("CPSC", 200)).
pub fn course_level(code: &str) -> Option<(String, u32)> {
    let (subject, number, _) = parse_course_code(code)?;
    Some((subject, number / 100 * 100))
}

/// The lecture/lab partner of a course in a lab-bearing subject:
/// "BIOL 105" -> "BIOL 105L" and "BIOL 105L" -> "BIOL 105". Courses outside
/// `LAB_SUBJECTS` have no partner.
pub fn lab_pair(code: &str) -> Option<String> {
    let (subject, number, is_lab) = parse_course_code(code)?;
    if !LAB_SUBJECTS.contains(&subject.as_str()) {
        return None;
    }
    if is_lab {
        Some(format!("{} {}", subject, number))
    } else {
        Some(format!("{} {}L", subject, number))
    }
}

/// True when a completed-or-staged course sits exactly 100 levels below
/// `level` in the same subject. Courses below level 200 need no predecessor.
pub fn has_lower_level_course<'a, I>(courses: I, subject: &str, level: u32) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    if level < 200 {
        return true;
    }
    let required_level = level - 100;
    courses.into_iter().any(|code| {
        course_level(code)
            .map(|(subj, lvl)| subj == subject && lvl == required_level)
            .unwrap_or(false)
    })
}
