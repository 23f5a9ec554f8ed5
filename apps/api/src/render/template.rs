//! Static page shell shared by every rendered portfolio.

pub const STYLE: &str = r#"
:root { --bg: #0b0b0c; --fg: #f4f4f2; --muted: #8d8d8a; --line: #232325; --card: #141416; }
* { box-sizing: border-box; margin: 0; padding: 0; }
html { scroll-behavior: smooth; }
body { background: var(--bg); color: var(--fg); font: 16px/1.65 "Inter", system-ui, sans-serif; }
a { color: inherit; text-decoration: none; }
.container { max-width: 1120px; margin: 0 auto; padding: 0 24px; }
.nav { position: sticky; top: 0; z-index: 10; background: rgba(11,11,12,.86); backdrop-filter: blur(8px); border-bottom: 1px solid var(--line); }
.nav .container { display: flex; align-items: center; justify-content: space-between; height: 64px; }
.nav-brand { font-weight: 700; letter-spacing: .08em; }
.nav-links { display: flex; gap: 24px; flex-wrap: wrap; }
.nav-link { color: var(--muted); font-size: 14px; }
.nav-link:hover { color: var(--fg); }
.hero { padding: 120px 0 96px; border-bottom: 1px solid var(--line); }
.hero-inner { display: flex; gap: 48px; align-items: center; }
.hero-avatar { width: 144px; height: 144px; border-radius: 50%; background: var(--card); border: 1px solid var(--line); display: flex; align-items: center; justify-content: center; font-size: 44px; font-weight: 700; overflow: hidden; flex-shrink: 0; }
.hero-avatar img { width: 100%; height: 100%; object-fit: cover; }
.hero-role { color: var(--muted); text-transform: uppercase; letter-spacing: .2em; font-size: 13px; }
.hero-name { font-size: clamp(40px, 7vw, 84px); line-height: 1.05; margin: 12px 0 20px; }
.hero-headline { color: var(--muted); font-size: 20px; max-width: 720px; }
.highlights { margin-top: 28px; display: grid; gap: 8px; list-style: none; }
.highlights li::before { content: "\2014\00a0"; color: var(--muted); }
section { padding: 96px 0; border-bottom: 1px solid var(--line); }
.section-label { color: var(--muted); text-transform: uppercase; letter-spacing: .2em; font-size: 12px; margin-bottom: 8px; }
.section-title, .projects-tagline { font-size: 36px; margin-bottom: 40px; }
.about-text p { margin-bottom: 16px; max-width: 760px; }
.btn-outline { display: inline-block; margin-top: 16px; padding: 10px 22px; border: 1px solid var(--fg); border-radius: 999px; }
.experience-grid, .projects-grid, .education-grid, .list-section-grid { display: grid; gap: 20px; }
.projects-grid, .education-grid, .list-section-grid { grid-template-columns: repeat(auto-fill, minmax(280px, 1fr)); }
.exp-card, .project-card, .edu-card, .list-item { background: var(--card); border: 1px solid var(--line); border-radius: 14px; padding: 24px; }
.exp-header { display: flex; justify-content: space-between; gap: 16px; margin-bottom: 12px; }
.exp-company, .exp-date, .edu-school, .edu-year { color: var(--muted); }
.exp-bullets { padding-left: 20px; }
.project-image { height: 120px; border-radius: 10px; background: linear-gradient(135deg, #1d1d20, #0f0f10); display: flex; align-items: center; justify-content: center; margin-bottom: 16px; }
.project-image-placeholder { font-size: 40px; color: var(--muted); }
.project-tech { display: flex; flex-wrap: wrap; gap: 8px; margin-top: 14px; }
.tech-tag, .skill-tag { border: 1px solid var(--line); border-radius: 999px; padding: 4px 12px; font-size: 13px; }
.skill-item { border-top: 1px solid var(--line); }
.skill-header { display: flex; justify-content: space-between; padding: 20px 0; cursor: pointer; font-size: 20px; }
.skill-arrow { width: 20px; transition: transform .2s; }
.skill-item.open .skill-arrow { transform: rotate(45deg); }
.skill-content { display: none; padding-bottom: 20px; }
.skill-item.open .skill-content { display: block; }
.skill-tags { display: flex; flex-wrap: wrap; gap: 8px; }
.edu-degree { font-weight: 600; }
.footer { padding: 72px 0; }
.footer-title { font-size: 32px; margin-bottom: 20px; }
.footer-contact { display: flex; flex-wrap: wrap; gap: 20px; }
.footer-contact-link { border-bottom: 1px solid var(--muted); }
.footer-note { color: var(--muted); font-size: 13px; margin-top: 32px; }
@media (max-width: 720px) { .hero-inner { flex-direction: column; align-items: flex-start; } .nav-links { display: none; } }
"#;

pub const SCRIPT: &str = r#"
document.querySelectorAll('.skill-header').forEach(function (h) {
  h.addEventListener('click', function () { h.parentElement.classList.toggle('open'); });
});
"#;

pub const ARROW_ICON: &str = r#"<svg viewBox="0 0 24 24" width="16" height="16" fill="none" stroke="currentColor" stroke-width="2"><line x1="5" y1="12" x2="19" y2="12"></line><polyline points="12 5 19 12 12 19"></polyline></svg>"#;

pub const PLUS_ICON: &str = r#"<svg class="skill-arrow" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><line x1="12" y1="5" x2="12" y2="19"></line><line x1="5" y1="12" x2="19" y2="12"></line></svg>"#;
