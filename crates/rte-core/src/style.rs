//! Inline `style` attribute handling.

pub type Declarations = Vec<(String, String)>;

pub fn parse(raw: &str) -> Declarations {
    raw.split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            if property.is_empty() || value.is_empty() {
                return None;
            }
            Some((property, value.to_string()))
        })
        .collect()
}

pub fn serialize(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(property, value)| format!("{property}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn get<'a>(declarations: &'a [(String, String)], property: &str) -> Option<&'a str> {
    declarations
        .iter()
        .rev()
        .find(|(name, _)| name == property)
        .map(|(_, value)| value.as_str())
}

pub fn set(declarations: &mut Declarations, property: &str, value: &str) {
    match declarations.iter_mut().find(|(name, _)| name == property) {
        Some((_, existing)) => *existing = value.to_string(),
        None => declarations.push((property.to_string(), value.to_string())),
    }
}

pub fn remove(declarations: &mut Declarations, property: &str) {
    declarations.retain(|(name, _)| name != property);
}
