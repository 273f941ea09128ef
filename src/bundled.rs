//! Templates compiled into the binary.
//!
//! Each file is listed with the relative path it is rendered to. Paths follow the
//! same rules as a template directory on disk: every segment is a tera template
//! and a trailing `.tera` marks the body for rendering.

/// Manifest of the C++ skeleton.
pub const CPP_MANIFEST: &str = include_str!("../templates/cpp/template.toml");

/// Files of the C++ skeleton. The top folder is the project directory itself, so
/// the template is rendered into the project's parent.
pub const CPP_FILES: &[(&str, &str)] = &[
    (
        "{{ project_name }}/Source/{{ project_name }}.Target.cs.tera",
        include_str!("../templates/cpp/Target.cs.tera"),
    ),
    (
        "{{ project_name }}/Source/{{ project_name }}Editor.Target.cs.tera",
        include_str!("../templates/cpp/EditorTarget.cs.tera"),
    ),
    (
        "{{ project_name }}/Source/{{ project_name }}/{{ project_name }}.Build.cs.tera",
        include_str!("../templates/cpp/Build.cs.tera"),
    ),
    (
        "{{ project_name }}/Source/{{ project_name }}/{{ project_name }}.h.tera",
        include_str!("../templates/cpp/Module.h.tera"),
    ),
    (
        "{{ project_name }}/Source/{{ project_name }}/{{ project_name }}.cpp.tera",
        include_str!("../templates/cpp/Module.cpp.tera"),
    ),
];
