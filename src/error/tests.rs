//! Unit tests for error handling

use super::*;
use std::io;

#[cfg(test)]
mod import_error_tests {
    use super::*;

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let import_error = ImportError::from(json_error);

        match import_error {
            ImportError::Json(_) => (),
            _ => panic!("Expected Json error variant"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let import_error = ImportError::from(io_error);

        match import_error {
            ImportError::Io(_) => (),
            _ => panic!("Expected Io error variant"),
        }
    }

    #[test]
    fn test_invalid_header_error_conversion() {
        let header_error = reqwest::header::HeaderValue::from_str("invalid\nheader").unwrap_err();
        let import_error = ImportError::from(header_error);

        match import_error {
            ImportError::InvalidHeader(_) => (),
            _ => panic!("Expected InvalidHeader error variant"),
        }
    }

    #[test]
    fn test_parse_int_error_conversion() {
        let parse_error = "not_a_season".parse::<u16>().unwrap_err();
        let import_error = ImportError::from(parse_error);

        match import_error {
            ImportError::InvalidNumber(_) => (),
            _ => panic!("Expected InvalidNumber error variant"),
        }
    }

    #[test]
    fn test_sqlite_error_conversion() {
        let db_error = rusqlite::Error::InvalidColumnType(
            0,
            "season".to_string(),
            rusqlite::types::Type::Null,
        );
        let import_error = ImportError::from(db_error);

        match import_error {
            ImportError::Sqlite(_) => (),
            _ => panic!("Expected Sqlite error variant"),
        }
    }

    #[test]
    fn test_missing_env_error() {
        let error = ImportError::MissingEnv {
            var: "SUPABASE_URL".to_string(),
        };

        let error_string = error.to_string();
        assert!(error_string.contains("Missing required environment variable"));
        assert!(error_string.contains("SUPABASE_URL"));
    }

    #[test]
    fn test_store_error_display() {
        let error = ImportError::Store {
            table: "teams".to_string(),
            status: 409,
            message: "duplicate key value violates unique constraint".to_string(),
        };

        let error_string = error.to_string();
        assert!(error_string.contains("teams"));
        assert!(error_string.contains("409"));
        assert!(error_string.contains("duplicate key"));
    }

    #[test]
    fn test_no_data_error() {
        let error = ImportError::NoData {
            endpoint: "/venues".to_string(),
        };
        assert_eq!(error.to_string(), "API returned no data for /venues");
    }

    #[test]
    fn test_short_message_truncates() {
        let error = ImportError::Aborted {
            reason: "duplicate ids found in games.csv".to_string(),
        };

        let short = error.short_message(16);
        assert_eq!(short.chars().count(), 16);
        assert_eq!(short, "Import aborted: ");
    }

    #[test]
    fn test_error_source_chain() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let import_error = ImportError::from(io_error);

        let error_trait: &dyn std::error::Error = &import_error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_result_type_alias_error() {
        fn test_function() -> Result<String> {
            Err(ImportError::UnknownTable {
                table: "nope".to_string(),
            })
        }

        match test_function().unwrap_err() {
            ImportError::UnknownTable { table } => assert_eq!(table, "nope"),
            _ => panic!("Expected UnknownTable error"),
        }
    }
}
