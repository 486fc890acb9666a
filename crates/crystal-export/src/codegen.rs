//! Lumerical script generation from a recorded session

use crate::error::Result;
use crate::session::{ObjectKind, ScriptSession, SessionCommand};
use minijinja::{context, Environment};

const LSF_TEMPLATE: &str = r##"# =============================================================================
# Lumerical FDTD scene - auto-generated from crystal lattice models
# {{ header_comment }}
#
# Generated: {{ timestamp }}
# Crystals: {{ crystals|join(", ") }}
# =============================================================================

switchtolayout;
{% for cmd in commands %}
{% if cmd.op == "delete" %}
select("{{ cmd.name }}");
delete;
{% else %}
{{ cmd.command }};
set("name", "{{ cmd.name }}");
{% for prop in cmd.properties %}
set("{{ prop.key }}", {{ prop.value }});
{% endfor %}
{% endif %}
{% endfor %}
"##;

/// Render every recorded session call as a runnable `.lsf` script
pub fn render_lsf(session: &ScriptSession, header_comment: &str) -> Result<String> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.add_template("lsf", LSF_TEMPLATE)?;

    let template = env.get_template("lsf")?;

    let commands: Vec<_> = session
        .commands()
        .iter()
        .map(|cmd| match cmd {
            SessionCommand::Delete(name) => serde_json::json!({
                "op": "delete",
                "name": name,
            }),
            SessionCommand::Add(object) => {
                let properties: Vec<_> = object
                    .properties
                    .iter()
                    .map(|(key, value)| {
                        serde_json::json!({
                            "key": key,
                            "value": value.to_script(),
                        })
                    })
                    .collect();
                serde_json::json!({
                    "op": "add",
                    "command": object.kind.command(),
                    "name": object.name,
                    "properties": properties,
                })
            }
        })
        .collect();

    let crystals: Vec<_> = session
        .objects()
        .iter()
        .filter(|o| o.kind == ObjectKind::StructureGroup)
        .map(|o| o.name.clone())
        .collect();

    let output = template.render(context! {
        header_comment => header_comment,
        timestamp => chrono::Utc::now().to_rfc3339(),
        crystals => crystals,
        commands => commands,
    })?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{EngineSession, SceneObject};

    #[test]
    fn test_empty_session_renders() {
        let script = render_lsf(&ScriptSession::new(), "test").unwrap();
        assert!(script.contains("switchtolayout;"));
        assert!(script.contains("# test"));
    }

    #[test]
    fn test_upsert_renders_select_delete_add() {
        let mut session = ScriptSession::new();
        session
            .upsert(
                SceneObject::new(ObjectKind::Rect, "base")
                    .with("x", 1e-6)
                    .with("material", "algaas_lpedraza"),
            )
            .unwrap();

        let script = render_lsf(&session, "test").unwrap();
        let expected = "select(\"base\");\ndelete;\naddrect;\nset(\"name\", \"base\");\n\
                        set(\"x\", 1e-6);\nset(\"material\", \"algaas_lpedraza\");\n";
        assert!(script.contains(expected), "{script}");
    }

    #[test]
    fn test_structure_group_script_is_quoted() {
        let mut session = ScriptSession::new();
        session
            .add(
                SceneObject::new(ObjectKind::StructureGroup, "pc")
                    .with("script", "deleteall;\n\naddcircle;\nset(\"radius\", 1e-7);\n"),
            )
            .unwrap();

        let script = render_lsf(&session, "test").unwrap();
        assert!(script.contains("addstructuregroup;"));
        assert!(script.contains("set(\"script\", 'deleteall;"));
        assert!(script.contains("# Crystals: pc"));
    }
}
