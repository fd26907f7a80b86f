use crate::workflows::turnover::RelettingOption;

/// Strips invisible characters, collapses whitespace and lowercases.
pub(crate) fn normalize_cell(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// Maps the spellings found in exported case lists onto a reletting option.
pub(crate) fn reletting_option(value: &str) -> Option<RelettingOption> {
    let key: String = normalize_cell(value)
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect();

    match key.as_str() {
        "relet" | "willberelet" | "reletting" => Some(RelettingOption::Relet),
        "successorknown" | "successortenantknown" | "successor" => {
            Some(RelettingOption::SuccessorKnown)
        }
        "renovation" | "renovate" => Some(RelettingOption::Renovation),
        _ => None,
    }
}
