use crate::api::errors::ApiError;
use crate::db::types::AccessType;
use crate::services::exam_activation::{LISTENING_PARTS, READING_PARTS};

const SPEAKING_PART_TYPES: [&str; 3] = ["part1", "part2", "part3"];

/// Parses admin-supplied audience tags, rejecting the first unknown one. Duplicates
/// collapse while the submitted order is kept.
pub(crate) fn parse_access_types(values: &[String]) -> Result<Vec<AccessType>, ApiError> {
    let mut parsed = Vec::with_capacity(values.len());
    for value in values {
        let access_type = AccessType::parse(value).ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Invalid access type: {value}. Must be one of: no vip, vip, student"
            ))
        })?;
        if !parsed.contains(&access_type) {
            parsed.push(access_type);
        }
    }
    Ok(parsed)
}

pub(crate) fn validate_listening_part(part_number: i32) -> Result<(), ApiError> {
    if (1..=LISTENING_PARTS).contains(&part_number) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Part number must be between 1 and {LISTENING_PARTS}"
        )))
    }
}

pub(crate) fn validate_reading_part(part_number: i32) -> Result<(), ApiError> {
    if (1..=READING_PARTS).contains(&part_number) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("Part number must be between 1 and {READING_PARTS}")))
    }
}

pub(crate) fn validate_speaking_part_type(part_type: &str) -> Result<(), ApiError> {
    if SPEAKING_PART_TYPES.contains(&part_type) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Part type must be one of: {}",
            SPEAKING_PART_TYPES.join(", ")
        )))
    }
}

pub(crate) fn validate_essay_inputs(essay_text: &str, instructions: &str) -> Result<(), ApiError> {
    if essay_text.trim().is_empty() || instructions.trim().is_empty() {
        Err(ApiError::BadRequest("Essay text and instructions cannot be empty".to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_types_are_checked_and_deduplicated() {
        let parsed =
            parse_access_types(&["vip".to_string(), "no vip".to_string(), "vip".to_string()])
                .expect("valid tags");
        assert_eq!(parsed, vec![AccessType::Vip, AccessType::NoVip]);

        let err = parse_access_types(&["premium".to_string()]).expect_err("unknown tag");
        assert!(matches!(
            err,
            ApiError::BadRequest(message) if message.starts_with("Invalid access type: premium")
        ));
    }

    #[test]
    fn listening_parts_are_one_to_four() {
        assert!(validate_listening_part(1).is_ok());
        assert!(validate_listening_part(4).is_ok());
        assert!(validate_listening_part(0).is_err());
        assert!(validate_listening_part(5).is_err());
    }

    #[test]
    fn reading_parts_are_one_to_three() {
        assert!(validate_reading_part(3).is_ok());
        let err = validate_reading_part(4).expect_err("fourth part");
        assert!(matches!(
            err,
            ApiError::BadRequest(message) if message == "Part number must be between 1 and 3"
        ));
    }

    #[test]
    fn speaking_part_types_are_fixed() {
        assert!(validate_speaking_part_type("part2").is_ok());
        assert!(validate_speaking_part_type("Part2").is_err());
        assert!(validate_speaking_part_type("part4").is_err());
    }

    #[test]
    fn blank_essay_inputs_are_rejected() {
        assert!(validate_essay_inputs("An essay", "Discuss").is_ok());
        assert!(validate_essay_inputs("   ", "Discuss").is_err());
        assert!(validate_essay_inputs("An essay", "").is_err());
    }
}
