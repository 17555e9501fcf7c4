use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Tous les champs sont obligatoires.")]
    MissingFields,

    #[error("Format e-mail invalide")]
    InvalidEmail,

    #[error("E-mail déjà utilisé")]
    EmailTaken,

    #[error("Nom d'utilisateur invalide")]
    InvalidUsername,

    #[error("L'utilisateur existe déjà")]
    UsernameTaken,
}

/// `^[a-z0-9]{3,64}$`
pub fn check_username(username: &str) -> Result<(), ValidationError> {
    let well_formed = (3..=64).contains(&username.len())
        && username
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());

    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::InvalidUsername)
    }
}

/// `^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$`
pub fn check_email(email: &str) -> Result<(), ValidationError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return Err(ValidationError::InvalidEmail);
    };

    let local_ok = !local.is_empty()
        && local
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"._%+-".contains(&b));
    let host_ok = !host.is_empty()
        && host
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-');
    let tld_ok = tld.len() >= 2 && tld.bytes().all(|b| b.is_ascii_alphabetic());

    if local_ok && host_ok && tld_ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}
