//! Wrapper functions that evaluate `footo run` output in the calling shell

use crate::cli::options::ShellKind;

// Leading options are passed through untouched; set FOOTO_HOME instead of
// --home when running modules through the wrapper.
const BASH_WRAPPER: &str = r#"# footo: source module output into the current shell
footo() {
    case "${1-}" in
        ""|-*|create|list|info|shell-init|help)
            command footo "$@"
            ;;
        *)
            local __footo_line
            __footo_line="$(command footo "$@")" || return $?
            [ -n "$__footo_line" ] && eval "$__footo_line"
            ;;
    esac
}
"#;

const PWSH_WRAPPER: &str = r#"# footo: source module output into the current session
function footo {
    $footoExe = (Get-Command footo -CommandType Application | Select-Object -First 1).Source
    $passthrough = @('create', 'list', 'info', 'shell-init', 'help')
    if ($args.Count -eq 0 -or "$($args[0])".StartsWith('-') -or $passthrough -contains $args[0]) {
        & $footoExe @args
        return
    }
    $footoLine = & $footoExe @args
    if ($LASTEXITCODE -ne 0) { return }
    if ($footoLine) { Invoke-Expression ($footoLine -join "`n") }
}
"#;

pub fn wrapper(shell: ShellKind) -> &'static str {
    match shell {
        ShellKind::Bash => BASH_WRAPPER,
        ShellKind::Pwsh => PWSH_WRAPPER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrappers_evaluate_run_output() {
        assert!(wrapper(ShellKind::Bash).contains(r#"eval "$__footo_line""#));
        assert!(wrapper(ShellKind::Pwsh).contains("Invoke-Expression"));
    }
}
