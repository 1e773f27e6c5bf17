//! Printable bilingual student report.
//!
//! Renders the official RTL report document: Arabic body text with Latin
//! numerals, status banding, the simulation narratives as a recommendation
//! list and an auto-print script. Consumes the engine's output as an
//! ordered list of plain strings.

use chrono::Utc;

pub struct ReportContext<'a> {
    pub student_name: &'a str,
    pub student_id: &'a str,
    pub department: &'a str,
    pub prediction: f64,
    pub roadmap: &'a [String],
    pub attendance_rate: f64,
    pub study_hours: f64,
}

/// Bands a predicted score into the three official stages.
pub fn status_band(prediction: f64) -> &'static str {
    if prediction < 50.0 {
        "مرحلة الخطر (Critical)"
    } else if prediction < 80.0 {
        "مرحلة الاستقرار (Stable)"
    } else {
        "مرحلة التميز (Excellent)"
    }
}

pub fn render_printable_report(ctx: &ReportContext<'_>) -> String {
    let recommendations: String = ctx
        .roadmap
        .iter()
        .map(|step| format!("<li>{}</li>", step))
        .collect();
    let date_str = Utc::now().format("%Y-%m-%d");

    format!(
        r#"<!DOCTYPE html>
<html lang="ar" dir="rtl">
<head>
    <meta charset="UTF-8">
    <title>تقرير الطالب {name}</title>
    <style>
        body {{ font-family: 'Times New Roman', serif; padding: 40px; margin: 0; }}
        .report-container {{ border: 2px solid #000; padding: 40px; max-width: 210mm; margin: auto; background-color: white; }}
        .header {{ text-align: center; margin-bottom: 30px; }}
        h2, h3, h4 {{ margin: 5px 0; color: black; }}
        hr {{ border-top: 2px solid black; }}
        table {{ width: 100%; border-collapse: collapse; margin-bottom: 20px; }}
        td {{ padding: 10px; font-size: 16px; vertical-align: top; }}
        .section {{ margin-bottom: 20px; border: 1px solid #000; padding: 15px; }}
        .num-ltr {{ direction: ltr; unicode-bidi: embed; display: inline-block; font-weight: bold; }}
        ul {{ padding-right: 20px; }}
        li {{ margin-bottom: 5px; font-weight: bold; }}
        @media print {{ .no-print {{ display: none; }} }}
    </style>
    <script>window.onload = function() {{ window.print(); }}</script>
</head>
<body>
    <div class="report-container">
        <div class="header">
            <h2>وزارة التعليم العالي والبحث العلمي</h2>
            <h3>الجامعة التكنولوجية - قسم {department}</h3>
            <h4>تقرير تقييم الأداء الأكاديمي للطلاب</h4>
        </div>
        <hr>
        <table>
            <tr><td style="text-align: right;"><strong>اسم الطالب:</strong> {name}</td><td style="text-align: left;"><strong>الرقم الجامعي:</strong> <span class="num-ltr">{id}</span></td></tr>
            <tr><td style="text-align: right;"><strong>تاريخ الإصدار:</strong> <span class="num-ltr">{date}</span></td><td style="text-align: left;"><strong>المعدل المتوقع:</strong> <span class="num-ltr">{prediction:.1}%</span></td></tr>
        </table>
        <div class="section">
            <h4>أولاً: ملخص التحليل الفني</h4>
            <p>استناداً إلى معطيات الذكاء الاصطناعي، يُصنف الأداء الحالي للطالب ضمن <strong>{status}</strong>.
            أظهر التحليل أن العوامل الأكثر تأثيراً هي نسبة الحضور (<span class="num-ltr">{attendance}%</span>)
            وساعات الدراسة (<span class="num-ltr">{study}</span> ساعة/أسبوع).</p>
        </div>
        <div class="section">
            <h4>ثانياً: التوصيات وخارطة الطريق</h4>
            <ul>{recommendations}</ul>
        </div>
        <br><br><br>
        <table style="text-align: center; margin-top: 50px;">
            <tr><td>____________________<br>توقيع المرشد الأكاديمي</td><td>____________________<br>ختم رئاسة القسم</td></tr>
        </table>
    </div>
</body>
</html>
"#,
        name = ctx.student_name,
        id = ctx.student_id,
        department = ctx.department,
        date = date_str,
        prediction = ctx.prediction,
        status = status_band(ctx.prediction),
        attendance = ctx.attendance_rate,
        study = ctx.study_hours,
        recommendations = recommendations,
    )
}
