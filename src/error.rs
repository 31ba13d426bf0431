use quick_error::quick_error;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum RoiMaskError {
        /// Malformed input: empty vertex set, out of range vertex ids, mismatched shapes.
        InvalidInput(msg: String) {
            display("Invalid input: {}", msg)
        }

        /// The world to voxel transform cannot be inverted.
        SingularTransform {
            display("Singular transform: the affine is not invertible")
        }

        /// Unknown or unsupported option value.
        Configuration(msg: String) {
            display("Configuration error: {}", msg)
        }
    }
}

impl RoiMaskError {
    pub(crate) fn invalid_input<S: Into<String>>(msg: S) -> RoiMaskError {
        RoiMaskError::InvalidInput(msg.into())
    }

    pub(crate) fn configuration<S: Into<String>>(msg: S) -> RoiMaskError {
        RoiMaskError::Configuration(msg.into())
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, RoiMaskError>;


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_messages_carry_their_details() {
        let err = RoiMaskError::invalid_input("vertex 12 out of range");
        assert!(format!("{}", err).contains("vertex 12 out of range"));

        let err = RoiMaskError::configuration("unknown overlap policy 'merge'");
        assert!(format!("{}", err).contains("'merge'"));

        assert!(format!("{}", RoiMaskError::SingularTransform).contains("not invertible"));
    }
}
