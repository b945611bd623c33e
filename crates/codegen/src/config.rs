//! Build-tool and TypeScript configuration files.

/// Generate next.config.mjs content. Static export into `out/`.
pub fn next_config() -> String {
    r#"/** @type {import('next').NextConfig} */
const nextConfig = {
  output: 'export',
  trailingSlash: true,
  images: { unoptimized: true },
};

export default nextConfig;
"#
    .to_string()
}

/// Generate tsconfig.json content with the `@/*` → `./src/*` alias the
/// copied section components rely on.
pub fn tsconfig_json() -> String {
    r#"{
  "compilerOptions": {
    "target": "ES2020",
    "lib": ["dom", "dom.iterable", "esnext"],
    "allowJs": true,
    "skipLibCheck": true,
    "strict": true,
    "noEmit": true,
    "esModuleInterop": true,
    "module": "esnext",
    "moduleResolution": "bundler",
    "resolveJsonModule": true,
    "isolatedModules": true,
    "jsx": "preserve",
    "incremental": true,
    "plugins": [{ "name": "next" }],
    "paths": {
      "@/*": ["./src/*"]
    }
  },
  "include": ["next-env.d.ts", "**/*.ts", "**/*.tsx", ".next/types/**/*.ts"],
  "exclude": ["node_modules"]
}
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsconfig_is_json_with_alias() {
        let v: serde_json::Value = serde_json::from_str(&tsconfig_json()).unwrap();
        assert_eq!(v["compilerOptions"]["paths"]["@/*"][0], "./src/*");
    }

    #[test]
    fn next_config_exports_statically() {
        assert!(next_config().contains("output: 'export'"));
    }
}
