//! Create/edit payload for backend characters and the rules it must satisfy
//! before it is sent.

use crate::error::{CatalogError, CatalogResult, FieldError};
use serde::{Deserialize, Serialize};

const MAX_TEXT: usize = 100;

/// Uploaded image sent as the `imagen` multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterDraft {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub especie: String,
    #[serde(default)]
    pub genero: String,
    #[serde(default)]
    pub base_ki: i64,
    #[serde(default)]
    pub total_ki: i64,
    #[serde(default)]
    pub afiliacion: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagen_url: Option<String>,
    #[serde(skip)]
    pub image_file: Option<ImageUpload>,
}

fn require(errors: &mut Vec<FieldError>, field: &'static str, value: &str, max: Option<usize>) {
    if value.is_empty() {
        errors.push(FieldError {
            field,
            message: "required".to_string(),
        });
    } else if let Some(max) = max {
        if value.chars().count() > max {
            errors.push(FieldError {
                field,
                message: format!("at most {} characters", max),
            });
        }
    }
}

fn parse_ki(field: &'static str, value: &str) -> Result<i64, FieldError> {
    value.trim().parse().map_err(|_| FieldError {
        field,
        message: "must be a whole number".to_string(),
    })
}

impl CharacterDraft {
    /// Trim every string; a blank image URL becomes `None`.
    pub fn trimmed(mut self) -> Self {
        for s in [
            &mut self.nombre,
            &mut self.especie,
            &mut self.genero,
            &mut self.afiliacion,
            &mut self.descripcion,
        ] {
            *s = s.trim().to_string();
        }
        self.imagen_url = self
            .imagen_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        self
    }

    /// Trimmed draft, or every rule it breaks.
    pub fn validate(self) -> CatalogResult<Self> {
        let draft = self.trimmed();
        let mut errors = Vec::new();

        require(&mut errors, "nombre", &draft.nombre, Some(MAX_TEXT));
        require(&mut errors, "especie", &draft.especie, Some(MAX_TEXT));
        require(&mut errors, "genero", &draft.genero, None);
        require(&mut errors, "afiliacion", &draft.afiliacion, Some(MAX_TEXT));
        require(&mut errors, "descripcion", &draft.descripcion, None);

        for (field, value) in [("base_ki", draft.base_ki), ("total_ki", draft.total_ki)] {
            if value < 0 {
                errors.push(FieldError {
                    field,
                    message: "must be >= 0".to_string(),
                });
            }
        }

        if draft.imagen_url.is_none() && draft.image_file.is_none() {
            errors.push(FieldError {
                field: "imagen",
                message: "an image URL or file is required".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(draft)
        } else {
            Err(CatalogError::Validation(errors))
        }
    }

    /// Set one text field from a submitted form. Unknown keys are ignored.
    pub fn set_form_field(&mut self, key: &str, value: String) -> Result<(), FieldError> {
        match key {
            "nombre" => self.nombre = value,
            "especie" => self.especie = value,
            "genero" => self.genero = value,
            "afiliacion" => self.afiliacion = value,
            "descripcion" => self.descripcion = value,
            "imagen_url" => self.imagen_url = Some(value),
            "base_ki" => self.base_ki = parse_ki("base_ki", &value)?,
            "total_ki" => self.total_ki = parse_ki("total_ki", &value)?,
            _ => {}
        }
        Ok(())
    }

    /// Text fields as multipart pairs (image URL included when set).
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("nombre", self.nombre.clone()),
            ("especie", self.especie.clone()),
            ("genero", self.genero.clone()),
            ("base_ki", self.base_ki.to_string()),
            ("total_ki", self.total_ki.to_string()),
            ("afiliacion", self.afiliacion.clone()),
            ("descripcion", self.descripcion.clone()),
        ];
        if let Some(url) = &self.imagen_url {
            fields.push(("imagen_url", url.clone()));
        }
        fields
    }
}
