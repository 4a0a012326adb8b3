//! Declarative description of the student form and its fields.

pub const FIRST_NAME: &str = "firstName";
pub const LAST_NAME: &str = "lastName";
pub const EMAIL: &str = "email";
pub const PHONE: &str = "phone";
pub const DATE_OF_BIRTH: &str = "dateOfBirth";
pub const STUDENT_ID: &str = "studentId";
pub const SCHOOL: &str = "school";
pub const GRADE: &str = "grade";
pub const GPA: &str = "gpa";

pub const GRADE_OPTIONS: &[&str] = &["9", "10", "11", "12"];

/// Supported input kinds. The kind selects the type-specific validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Telephone,
    Date,
    Decimal,
    Choice(Vec<&'static str>),
}

impl FieldKind {
    /// Resolves `input` against the options of a choice field, ignoring case.
    pub fn resolve_choice(&self, input: &str) -> Option<&'static str> {
        match self {
            FieldKind::Choice(options) => options
                .iter()
                .find(|candidate| candidate.eq_ignore_ascii_case(input.trim()))
                .copied(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: &'static str,
    pub help: Option<&'static str>,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            default: "",
            help: None,
        }
    }

    pub fn with_required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: &'static str) -> Self {
        self.default = default;
        self
    }

    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

/// Metadata describing a full form, including field order.
#[derive(Debug, Clone)]
pub struct FormDescriptor {
    pub name: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

impl FormDescriptor {
    pub fn new(name: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Self { name, fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.fields.iter().filter(|field| field.required)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }
}

/// The student-information form.
pub fn student_form() -> FormDescriptor {
    FormDescriptor::new(
        "Student Information",
        vec![
            FieldDescriptor::new(FIRST_NAME, "First Name", FieldKind::Text).with_required(),
            FieldDescriptor::new(LAST_NAME, "Last Name", FieldKind::Text).with_required(),
            FieldDescriptor::new(EMAIL, "Email Address", FieldKind::Email)
                .with_required()
                .with_help("e.g. jo@school.edu"),
            FieldDescriptor::new(PHONE, "Phone Number", FieldKind::Telephone)
                .with_help("Digits, optional leading +; spaces, dashes and parentheses ignored"),
            FieldDescriptor::new(DATE_OF_BIRTH, "Date of Birth", FieldKind::Date)
                .with_required()
                .with_help("YYYY-MM-DD; students must be at least 13 years old"),
            FieldDescriptor::new(STUDENT_ID, "Student ID", FieldKind::Text).with_required(),
            FieldDescriptor::new(SCHOOL, "School", FieldKind::Text).with_required(),
            FieldDescriptor::new(GRADE, "Grade", FieldKind::Choice(GRADE_OPTIONS.to_vec()))
                .with_required()
                .with_help("One of 9, 10, 11, 12"),
            FieldDescriptor::new(GPA, "GPA", FieldKind::Decimal)
                .with_help("Between 0.00 and 4.00"),
        ],
    )
}
