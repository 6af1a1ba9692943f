//! Pull request templates

use std::collections::HashMap;

/// Title of every pull request the action opens
pub const PR_TITLE: &str = "Frizbee: Pin images and actions to commit hash";

const SECURITY_GUIDE_URL: &str = "https://docs.github.com/en/actions/security-guides/security-hardening-for-github-actions#using-third-party-actions";
const PROJECT_URL: &str = "https://github.com/stacklok/frizbee-action";

const PULL_REQUEST_BODY: &str = r#"## {{ title }}

The following PR pins images and actions to their commit hash.

Pinning images and actions to their commit hash ensures that the same version of the image or action is used every time the workflow runs. This is important for reproducibility and security.

Pinning is a [security practice recommended by GitHub]({{ security_guide }}).

🥏 Posted on behalf of 🥏 [frizbee-action]({{ project }}), by [Stacklok](https://stacklok.com).

"#;

/// Replace `{{ name }}` and `{{name}}` placeholders
pub fn render(template: &str, variables: &HashMap<&str, &str>) -> String {
    let mut content = template.to_string();
    for (key, value) in variables {
        content = content.replace(&format!("{{{{ {} }}}}", key), value);
        content = content.replace(&format!("{{{{{}}}}}", key), value);
    }
    content
}

/// Body of the pull request
pub fn pull_request_body() -> String {
    let variables = HashMap::from([
        ("title", PR_TITLE),
        ("security_guide", SECURITY_GUIDE_URL),
        ("project", PROJECT_URL),
    ]);
    render(PULL_REQUEST_BODY, &variables)
}
