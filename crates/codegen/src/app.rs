//! App Router layout and page entrypoints.

/// Generate src/app/layout.tsx content.
pub fn root_layout() -> String {
    r#"// Generated by forja. Do not edit.
import type { Metadata } from "next";
import "./globals.css";
import campaign from "@/data/campaign.json";

export const metadata: Metadata = {
  title: campaign.name,
  description: campaign.description,
};

export default function RootLayout({
  children,
}: Readonly<{ children: React.ReactNode }>) {
  return (
    <html lang={campaign.defaultLocale}>
      <body>{children}</body>
    </html>
  );
}
"#
    .to_string()
}

/// Generate src/app/page.tsx content: the default locale at `/`.
pub fn root_page() -> String {
    r#"// Generated by forja. Do not edit.
import { SectionRenderer } from "@/components/forja/SectionRenderer";
import campaign from "@/data/campaign.json";

export default function Page() {
  return (
    <main>
      <SectionRenderer locale={campaign.defaultLocale} />
    </main>
  );
}
"#
    .to_string()
}

/// Generate src/app/[locale]/page.tsx content: one static page per locale.
pub fn locale_page() -> String {
    r#"// Generated by forja. Do not edit.
import { SectionRenderer } from "@/components/forja/SectionRenderer";
import campaign from "@/data/campaign.json";

export const dynamicParams = false;

export function generateStaticParams() {
  return campaign.locales.map((locale) => ({ locale }));
}

export default async function LocalePage({
  params,
}: {
  params: Promise<{ locale: string }>;
}) {
  const { locale } = await params;
  return (
    <main>
      <SectionRenderer locale={locale} />
    </main>
  );
}
"#
    .to_string()
}
