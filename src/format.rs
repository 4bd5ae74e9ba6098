//! Display formatting for names, CPFs and phone numbers in listings.

/// `jOÃO` becomes `João`.
pub fn format_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// `52998224725` becomes `529.982.247-25`; anything that is not 11 digits is returned as is.
pub fn format_cpf(cpf: &str) -> String {
    if cpf.len() != 11 || !cpf.bytes().all(|b| b.is_ascii_digit()) {
        return cpf.to_string();
    }
    format!(
        "{}.{}.{}-{}",
        &cpf[0..3],
        &cpf[3..6],
        &cpf[6..9],
        &cpf[9..11]
    )
}

/// `+5511987654321` becomes `+55 (11) 98765-4321`.
pub fn format_phone(phone: &str) -> String {
    let Some(national) = phone.strip_prefix("+55") else {
        return phone.to_string();
    };
    if national.len() != 11 || !national.bytes().all(|b| b.is_ascii_digit()) {
        return phone.to_string();
    }
    format!(
        "+55 ({}) {}-{}",
        &national[0..2],
        &national[2..7],
        &national[7..11]
    )
}
